use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::{
    EntryRepository, MemoryRecordRepository, ProfileRepository, TagRepository,
};
use crate::db::schema;
use crate::db::traits::{
    DatabaseBackend, JournalStore, KnowledgeStore, MemoryRecordStore, MetadataStore,
    ProfileStore,
};
use crate::db::MetadataRepository;
use crate::error::Result;
use crate::models::{Era, JournalEntry, KnowledgeTag, MemoryHit, MemoryRecord, NewTag, Profile};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn get_profile(&self) -> Result<Profile> {
        let conn = self.db.connect()?;
        ProfileRepository::get_all(&conn).await
    }
    async fn set_profile(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connect()?;
        ProfileRepository::set(&conn, key, value).await
    }
    async fn set_profile_bulk(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let conn = self.db.connect()?;
        let pairs: Vec<(String, String)> = values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        ProfileRepository::set_many(&conn, &pairs).await
    }
    async fn profile_is_complete(&self) -> Result<bool> {
        let conn = self.db.connect()?;
        ProfileRepository::is_complete(&conn).await
    }
}

#[async_trait]
impl JournalStore for LibSqlBackend {
    async fn save_entry(&self, content: &str, ai_response: Option<&str>) -> Result<i64> {
        let conn = self.db.connect()?;
        EntryRepository::create(&conn, content, ai_response).await
    }
    async fn get_entry(&self, id: i64) -> Result<Option<JournalEntry>> {
        let conn = self.db.connect()?;
        EntryRepository::get_by_id(&conn, id).await
    }
    async fn get_all_entries(&self) -> Result<Vec<JournalEntry>> {
        let conn = self.db.connect()?;
        EntryRepository::get_all(&conn).await
    }
    async fn get_entry_count(&self) -> Result<u64> {
        let conn = self.db.connect()?;
        EntryRepository::count(&conn).await
    }
}

#[async_trait]
impl KnowledgeStore for LibSqlBackend {
    async fn save_tags(&self, entry_id: i64, tags: &[NewTag]) -> Result<usize> {
        let conn = self.db.connect()?;
        TagRepository::create_batch(&conn, entry_id, tags).await
    }
    async fn get_all_tags(&self) -> Result<Vec<KnowledgeTag>> {
        let conn = self.db.connect()?;
        TagRepository::get_all(&conn).await
    }
}

#[async_trait]
impl MemoryRecordStore for LibSqlBackend {
    async fn create_memory_record(&self, record: &MemoryRecord) -> Result<()> {
        let conn = self.db.connect()?;
        MemoryRecordRepository::create(&conn, record).await
    }
    async fn update_memory_record_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        let conn = self.db.connect()?;
        MemoryRecordRepository::update_embedding(&conn, id, embedding).await
    }
    async fn count_memory_records(&self) -> Result<u64> {
        let conn = self.db.connect()?;
        MemoryRecordRepository::count(&conn).await
    }
    async fn get_unembedded_memory_records(&self, limit: u32) -> Result<Vec<MemoryRecord>> {
        let conn = self.db.connect()?;
        MemoryRecordRepository::get_unembedded(&conn, limit).await
    }
    async fn search_similar_memory_records(
        &self,
        embedding: &[f32],
        limit: u32,
        threshold: f32,
        era: &Era,
    ) -> Result<Vec<MemoryHit>> {
        let conn = self.db.connect()?;
        MemoryRecordRepository::search_similar(&conn, embedding, limit, threshold, era).await
    }
    async fn rebuild_memory_records(&self, dims: usize) -> Result<()> {
        let conn = self.db.connect()?;
        schema::rebuild_memories_table(&conn, dims).await
    }
}

#[async_trait]
impl MetadataStore for LibSqlBackend {
    async fn get_embedding_dimensions(&self) -> Result<Option<usize>> {
        let conn = self.db.connect()?;
        MetadataRepository::get_embedding_dimensions(&conn).await
    }
    async fn set_embedding_dimensions(&self, dims: usize) -> Result<()> {
        let conn = self.db.connect()?;
        MetadataRepository::set_embedding_dimensions(&conn, dims).await
    }
    async fn get_embedding_model(&self) -> Result<Option<String>> {
        let conn = self.db.connect()?;
        MetadataRepository::get_embedding_model(&conn).await
    }
    async fn set_embedding_model(&self, model: &str) -> Result<()> {
        let conn = self.db.connect()?;
        MetadataRepository::set_embedding_model(&conn, model).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::{keys, MemoryKind};

    async fn setup_test_db(dir: &tempfile::TempDir) -> LibSqlBackend {
        let config = DatabaseConfig {
            url: format!("file:{}", dir.path().join("memoir.db").display()),
            auth_token: None,
            local_path: None,
        };
        let db = Database::new(&config, 3)
            .await
            .expect("Failed to create database");

        LibSqlBackend::new(db)
    }

    #[tokio::test]
    async fn test_profile_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = setup_test_db(&dir).await;
            backend.set_profile(keys::CONSENT, "true").await.unwrap();
            backend
                .set_profile(keys::NAME_AND_LIFE_STAGE, "Ana, first job")
                .await
                .unwrap();
            assert!(!backend.profile_is_complete().await.unwrap());
        }

        let backend = setup_test_db(&dir).await;
        let profile = backend.get_profile().await.unwrap();
        assert!(profile.has_consent());
        assert!(!profile.is_complete());
        assert_eq!(profile.next_onboarding_question().map(|q| q.step), Some(2));
    }

    #[tokio::test]
    async fn test_bulk_profile_write() {
        let dir = tempfile::tempdir().unwrap();
        let backend = setup_test_db(&dir).await;

        let mut values = BTreeMap::new();
        values.insert(keys::NAME_AND_LIFE_STAGE.to_string(), "Leo".to_string());
        values.insert(keys::ONBOARDING_COMPLETE.to_string(), "true".to_string());
        backend.set_profile_bulk(&values).await.unwrap();

        assert!(backend.profile_is_complete().await.unwrap());
        assert_eq!(backend.get_profile().await.unwrap().get("name_and_life_stage"), Some("Leo"));
    }

    #[tokio::test]
    async fn test_rebuild_keeps_records_for_reembedding() {
        let dir = tempfile::tempdir().unwrap();
        let backend = setup_test_db(&dir).await;

        let record = MemoryRecord::new("Got a new job", MemoryKind::Journal)
            .with_embedding(vec![0.5, 0.5, 0.0]);
        backend.create_memory_record(&record).await.unwrap();
        assert!(backend
            .get_unembedded_memory_records(10)
            .await
            .unwrap()
            .is_empty());

        backend.rebuild_memory_records(4).await.unwrap();

        assert_eq!(backend.count_memory_records().await.unwrap(), 1);
        let pending = backend.get_unembedded_memory_records(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        backend
            .update_memory_record_embedding(&pending[0].id, &[0.1, 0.2, 0.3, 0.4])
            .await
            .unwrap();
        let hits = backend
            .search_similar_memory_records(&[0.1, 0.2, 0.3, 0.4], 3, 0.5, &Era::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}

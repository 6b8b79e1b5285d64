use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Era, JournalEntry, KnowledgeGraph, KnowledgeTag, MemoryHit, MemoryRecord, NewTag, Profile,
};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// Profile key/value pairs.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self) -> Result<Profile>;
    async fn set_profile(&self, key: &str, value: &str) -> Result<()>;
    async fn set_profile_bulk(&self, values: &BTreeMap<String, String>) -> Result<()>;
    async fn profile_is_complete(&self) -> Result<bool>;
}

/// Append-only journal entries.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn save_entry(&self, content: &str, ai_response: Option<&str>) -> Result<i64>;
    async fn get_entry(&self, id: i64) -> Result<Option<JournalEntry>>;
    /// Every entry, oldest first.
    async fn get_all_entries(&self) -> Result<Vec<JournalEntry>>;
    async fn get_entry_count(&self) -> Result<u64>;
}

/// Knowledge tags extracted from entries.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn save_tags(&self, entry_id: i64, tags: &[NewTag]) -> Result<usize>;
    async fn get_all_tags(&self) -> Result<Vec<KnowledgeTag>>;

    /// `[Type]: v1 | v2` lines, or the empty placeholder.
    async fn get_knowledge_summary(&self) -> Result<String> {
        let tags = self.get_all_tags().await?;
        Ok(KnowledgeGraph::from_tags(&tags).summary())
    }

    /// The first `per_type` values of every tag type.
    async fn get_knowledge_snapshot(&self, per_type: usize) -> Result<Vec<(String, Vec<String>)>> {
        let tags = self.get_all_tags().await?;
        Ok(KnowledgeGraph::from_tags(&tags).snapshot(per_type))
    }
}

/// Embedded memory records and vector search over them.
#[async_trait]
pub trait MemoryRecordStore: Send + Sync {
    async fn create_memory_record(&self, record: &MemoryRecord) -> Result<()>;
    async fn update_memory_record_embedding(&self, id: &str, embedding: &[f32]) -> Result<()>;
    async fn count_memory_records(&self) -> Result<u64>;
    async fn get_unembedded_memory_records(&self, limit: u32) -> Result<Vec<MemoryRecord>>;
    async fn search_similar_memory_records(
        &self,
        embedding: &[f32],
        limit: u32,
        threshold: f32,
        era: &Era,
    ) -> Result<Vec<MemoryHit>>;
    /// Recreate the vector table at a new width, clearing stored embeddings.
    async fn rebuild_memory_records(&self, dims: usize) -> Result<()>;
}

/// Key-value metadata store (e.g. embedding dimensions).
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_embedding_dimensions(&self) -> Result<Option<usize>>;
    async fn set_embedding_dimensions(&self, dims: usize) -> Result<()>;
    async fn get_embedding_model(&self) -> Result<Option<String>>;
    async fn set_embedding_model(&self, model: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Unified backend supertrait
// ---------------------------------------------------------------------------

/// A complete database backend that combines all store traits plus lifecycle
/// operations (sync).
#[async_trait]
pub trait DatabaseBackend:
    ProfileStore + JournalStore + KnowledgeStore + MemoryRecordStore + MetadataStore
{
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}

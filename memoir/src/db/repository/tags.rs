use chrono::Utc;
use libsql::{params, Connection};

use super::{db_timestamp, parse_db_timestamp};
use crate::error::Result;
use crate::models::{KnowledgeTag, NewTag};

pub struct TagRepository;

impl TagRepository {
    /// Stores `tags` against `entry_id`; blank values are skipped.
    pub async fn create_batch(conn: &Connection, entry_id: i64, tags: &[NewTag]) -> Result<usize> {
        if tags.is_empty() {
            return Ok(0);
        }

        let tx = conn.transaction().await?;
        let now = db_timestamp(&Utc::now());
        let mut stored = 0;
        for tag in tags {
            let value = tag.value.trim();
            if value.is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO knowledge_graph (entry_id, tag_type, tag_value, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry_id, tag.tag_type.label(), value, now.as_str()],
            )
            .await?;
            stored += 1;
        }
        tx.commit().await?;
        Ok(stored)
    }

    pub async fn get_all(conn: &Connection) -> Result<Vec<KnowledgeTag>> {
        let mut rows = conn
            .query(
                "SELECT id, entry_id, tag_type, tag_value, created_at FROM knowledge_graph
                 ORDER BY created_at ASC, id ASC",
                (),
            )
            .await?;

        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(KnowledgeTag {
                id: row.get(0)?,
                entry_id: row.get(1)?,
                tag_type: row.get(2)?,
                tag_value: row.get(3)?,
                created_at: parse_db_timestamp(&row.get::<String>(4)?),
            });
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_connection, EntryRepository};
    use crate::models::{KnowledgeGraph, TagType};

    #[tokio::test]
    async fn test_summary_over_stored_tags_never_repeats_values() {
        let conn = test_connection().await;
        let first = EntryRepository::create(&conn, "Lunch with Mia", None)
            .await
            .unwrap();
        let second = EntryRepository::create(&conn, "Mia again", None)
            .await
            .unwrap();

        TagRepository::create_batch(
            &conn,
            first,
            &[
                NewTag::new(TagType::Entity, "Mia"),
                NewTag::new(TagType::Event, "lunch"),
            ],
        )
        .await
        .unwrap();
        let stored = TagRepository::create_batch(
            &conn,
            second,
            &[
                NewTag::new(TagType::Entity, "Mia"),
                NewTag::new(TagType::Entity, "  "),
            ],
        )
        .await
        .unwrap();
        assert_eq!(stored, 1);

        let tags = TagRepository::get_all(&conn).await.unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(
            KnowledgeGraph::from_tags(&tags).summary(),
            "[Entity]: Mia\n[Event]: lunch"
        );
    }
}

use libsql::{params, Connection};

use super::{db_timestamp, parse_db_timestamp};
use crate::error::Result;
use crate::models::{Era, MemoryHit, MemoryRecord};

const COLUMNS: &str = "m.id, m.content, m.kind, m.categories, m.entry_id, m.created_at";

pub struct MemoryRecordRepository;

impl MemoryRecordRepository {
    pub async fn create(conn: &Connection, record: &MemoryRecord) -> Result<()> {
        let categories = serde_json::to_string(&record.categories)?;

        match &record.embedding {
            Some(embedding) => {
                conn.execute(
                    r#"
                    INSERT INTO memories (id, content, kind, categories, entry_id, embedding, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, vector32(?6), ?7)
                    "#,
                    params![
                        record.id.clone(),
                        record.content.clone(),
                        record.kind.to_string(),
                        categories,
                        record.entry_id,
                        serde_json::to_string(embedding)?,
                        db_timestamp(&record.created_at),
                    ],
                )
                .await?;
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO memories (id, content, kind, categories, entry_id, embedding, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
                    "#,
                    params![
                        record.id.clone(),
                        record.content.clone(),
                        record.kind.to_string(),
                        categories,
                        record.entry_id,
                        db_timestamp(&record.created_at),
                    ],
                )
                .await?;
            }
        }

        Ok(())
    }

    pub async fn update_embedding(conn: &Connection, id: &str, embedding: &[f32]) -> Result<()> {
        let embedding_json = serde_json::to_string(embedding)?;

        conn.execute(
            "UPDATE memories SET embedding = vector32(?2) WHERE id = ?1",
            params![id, embedding_json],
        )
        .await?;

        Ok(())
    }

    pub async fn count(conn: &Connection) -> Result<u64> {
        let mut rows = conn.query("SELECT COUNT(*) FROM memories", ()).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Records that still need an embedding, oldest first.
    pub async fn get_unembedded(conn: &Connection, limit: u32) -> Result<Vec<MemoryRecord>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM memories m WHERE m.embedding IS NULL
                     ORDER BY m.created_at ASC LIMIT ?1"
                ),
                params![limit],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Nearest records written within `era`; the era is applied before the limit.
    pub async fn search_similar(
        conn: &Connection,
        embedding: &[f32],
        limit: u32,
        threshold: f32,
        era: &Era,
    ) -> Result<Vec<MemoryHit>> {
        let embedding_json = serde_json::to_string(embedding)?;
        let (from, until) = era.bounds();

        let query = format!(
            r#"
            SELECT {COLUMNS},
                   1 - vector_distance_cos(m.embedding, vector32(?1)) as score
            FROM memories m
            WHERE m.embedding IS NOT NULL
              AND (1 - vector_distance_cos(m.embedding, vector32(?1))) >= ?2
              AND (?4 IS NULL OR m.created_at >= ?4)
              AND (?5 IS NULL OR m.created_at < ?5)
            ORDER BY score DESC, m.created_at DESC
            LIMIT ?3
            "#
        );

        let mut rows = conn
            .query(
                &query,
                params![
                    embedding_json,
                    threshold,
                    limit,
                    from.as_ref().map(db_timestamp),
                    until.as_ref().map(db_timestamp)
                ],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = Self::row_to_record(&row)?;
            let score = row.get::<f64>(6)? as f32;
            results.push(MemoryHit { record, score });
        }

        Ok(results)
    }

    fn row_to_record(row: &libsql::Row) -> Result<MemoryRecord> {
        Ok(MemoryRecord {
            id: row.get(0)?,
            content: row.get(1)?,
            kind: row.get::<String>(2)?.parse().unwrap_or_default(),
            categories: serde_json::from_str(&row.get::<String>(3)?).unwrap_or_default(),
            entry_id: row.get(4)?,
            embedding: None,
            created_at: parse_db_timestamp(&row.get::<String>(5)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_connection;
    use crate::models::MemoryKind;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let conn = test_connection().await;

        let job = MemoryRecord::new("Got a new job", MemoryKind::Journal)
            .with_embedding(vec![1.0, 0.0, 0.0]);
        let lunch = MemoryRecord::new("Had lunch with Mia", MemoryKind::Journal)
            .with_categories(vec!["Mia".into()])
            .with_entry(2)
            .with_embedding(vec![0.0, 1.0, 0.0]);
        MemoryRecordRepository::create(&conn, &job).await.unwrap();
        MemoryRecordRepository::create(&conn, &lunch).await.unwrap();

        let hits = MemoryRecordRepository::search_similar(
            &conn,
            &[0.1, 0.9, 0.0],
            5,
            0.0,
            &Era::default(),
        )
        .await
        .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.content, "Had lunch with Mia");
        assert_eq!(hits[0].record.categories, vec!["Mia".to_string()]);
        assert_eq!(hits[0].record.entry_id, Some(2));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_threshold_and_limit() {
        let conn = test_connection().await;
        for i in 0..4 {
            let record = MemoryRecord::new(format!("note {i}"), MemoryKind::DaySummary)
                .with_embedding(vec![1.0, i as f32, 0.0]);
            MemoryRecordRepository::create(&conn, &record).await.unwrap();
        }

        let hits = MemoryRecordRepository::search_similar(
            &conn,
            &[1.0, 0.0, 0.0],
            2,
            0.0,
            &Era::default(),
        )
        .await
        .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = MemoryRecordRepository::search_similar(
            &conn,
            &[0.0, 0.0, 1.0],
            5,
            0.5,
            &Era::default(),
        )
        .await
        .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_era_is_applied_before_limit() {
        let conn = test_connection().await;
        let mut school = MemoryRecord::new("Mia at school", MemoryKind::Journal)
            .with_embedding(vec![1.0, 0.2, 0.0]);
        school.created_at = Utc.with_ymd_and_hms(2019, 9, 2, 8, 0, 0).unwrap();
        MemoryRecordRepository::create(&conn, &school).await.unwrap();
        for i in 0..6 {
            let lunch = MemoryRecord::new(format!("lunch with Mia {i}"), MemoryKind::Journal)
                .with_embedding(vec![1.0, 0.0, 0.0]);
            MemoryRecordRepository::create(&conn, &lunch).await.unwrap();
        }

        let everything = MemoryRecordRepository::search_similar(
            &conn,
            &[1.0, 0.0, 0.0],
            5,
            0.0,
            &Era::default(),
        )
        .await
        .unwrap();
        assert!(everything.iter().all(|hit| hit.record.content != "Mia at school"));

        let era = Era {
            year_start: Some(2019),
            year_end: Some(2019),
            label: None,
        };
        let hits = MemoryRecordRepository::search_similar(&conn, &[1.0, 0.0, 0.0], 5, 0.0, &era)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.content, "Mia at school");
    }

    #[tokio::test]
    async fn test_unembedded_records_are_skipped_then_backfilled() {
        let conn = test_connection().await;
        let record = MemoryRecord::new("Pregunta: ? | Respuesta: !", MemoryKind::GuidedReflection);
        MemoryRecordRepository::create(&conn, &record).await.unwrap();

        let hits = MemoryRecordRepository::search_similar(
            &conn,
            &[1.0, 0.0, 0.0],
            5,
            -1.0,
            &Era::default(),
        )
        .await
        .unwrap();
        assert!(hits.is_empty());

        let pending = MemoryRecordRepository::get_unembedded(&conn, 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, MemoryKind::GuidedReflection);

        MemoryRecordRepository::update_embedding(&conn, &record.id, &[1.0, 0.0, 0.0])
            .await
            .unwrap();
        assert!(MemoryRecordRepository::get_unembedded(&conn, 10)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(MemoryRecordRepository::count(&conn).await.unwrap(), 1);
    }
}

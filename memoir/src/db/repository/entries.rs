use chrono::Utc;
use libsql::{params, Connection};

use super::{db_timestamp, parse_db_timestamp};
use crate::error::{MemoirError, Result};
use crate::models::JournalEntry;

pub struct EntryRepository;

impl EntryRepository {
    pub async fn create(conn: &Connection, content: &str, ai_response: Option<&str>) -> Result<i64> {
        let mut rows = conn
            .query(
                "INSERT INTO journal_entries (content, ai_response, created_at)
                 VALUES (?1, ?2, ?3) RETURNING id",
                params![content, ai_response.map(str::to_string), db_timestamp(&Utc::now())],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| MemoirError::Internal("Entry insert returned no id".to_string()))?;
        Ok(row.get::<i64>(0)?)
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<JournalEntry>> {
        let mut rows = conn
            .query(
                "SELECT id, content, ai_response, created_at FROM journal_entries WHERE id = ?1",
                params![id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// All entries, oldest first.
    pub async fn get_all(conn: &Connection) -> Result<Vec<JournalEntry>> {
        let mut rows = conn
            .query(
                "SELECT id, content, ai_response, created_at FROM journal_entries
                 ORDER BY created_at ASC, id ASC",
                (),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::row_to_entry(&row)?);
        }
        Ok(entries)
    }

    pub async fn count(conn: &Connection) -> Result<u64> {
        let mut rows = conn
            .query("SELECT COUNT(*) FROM journal_entries", ())
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }

    fn row_to_entry(row: &libsql::Row) -> Result<JournalEntry> {
        Ok(JournalEntry {
            id: row.get(0)?,
            content: row.get(1)?,
            ai_response: row.get(2)?,
            created_at: parse_db_timestamp(&row.get::<String>(3)?),
        })
    }
}

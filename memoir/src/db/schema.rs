use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection, embedding_dims: usize) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Profile key/value pairs, last write wins
        CREATE TABLE IF NOT EXISTS profile (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL UNIQUE,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Journal entries are append-only
        CREATE TABLE IF NOT EXISTS journal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            ai_response TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_journal_entries_created_at ON journal_entries(created_at);

        -- Knowledge tags extracted from entries
        CREATE TABLE IF NOT EXISTS knowledge_graph (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            tag_type TEXT NOT NULL,
            tag_value TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (entry_id) REFERENCES journal_entries(id)
        );

        CREATE INDEX IF NOT EXISTS idx_knowledge_graph_entry_id ON knowledge_graph(entry_id);

        -- Metadata key-value store
        CREATE TABLE IF NOT EXISTS memoir_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .await?;

    conn.execute_batch(&memories_table_sql("memories", embedding_dims))
        .await?;

    create_vector_indexes(conn).await?;

    Ok(())
}

fn memories_table_sql(table: &str, embedding_dims: usize) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'journal',
            categories TEXT NOT NULL DEFAULT '[]',
            entry_id INTEGER,
            embedding F32_BLOB({embedding_dims}),
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);
        "#
    )
}

/// Recreates the `memories` table with a new embedding width.
///
/// Rows are carried over with their embeddings cleared so they can be
/// re-embedded by the caller.
pub async fn rebuild_memories_table(conn: &Connection, embedding_dims: usize) -> Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS memories_rebuild")
        .await?;
    conn.execute_batch(&memories_table_sql("memories_rebuild", embedding_dims))
        .await?;
    conn.execute(
        "INSERT INTO memories_rebuild (id, content, kind, categories, entry_id, embedding, created_at)
         SELECT id, content, kind, categories, entry_id, NULL, created_at FROM memories",
        (),
    )
    .await?;
    conn.execute_batch(
        r#"
        DROP INDEX IF EXISTS memories_embedding_idx;
        DROP INDEX IF EXISTS idx_memories_created_at;
        DROP INDEX IF EXISTS idx_memories_rebuild_created_at;
        DROP TABLE memories;
        ALTER TABLE memories_rebuild RENAME TO memories;
        CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at);
        "#,
    )
    .await?;

    create_vector_indexes(conn).await?;
    tracing::info!(dims = embedding_dims, "Rebuilt memories table");

    Ok(())
}

async fn create_vector_indexes(conn: &Connection) -> Result<()> {
    let memory_index_exists: bool = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type='index' AND name='memories_embedding_idx'",
            (),
        )
        .await?
        .next()
        .await?
        .is_some();

    if !memory_index_exists {
        if let Err(e) = conn
            .execute(
                "CREATE INDEX IF NOT EXISTS memories_embedding_idx ON memories(libsql_vector_idx(embedding))",
                (),
            )
            .await
        {
            tracing::warn!("Vector index creation failed for memories (may already exist): {e}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut rows = conn
            .query(&format!("SELECT name FROM pragma_table_info('{table}')"), ())
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }
        names
    }

    #[tokio::test]
    async fn test_init_schema_creates_diary_tables() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();

        init_schema(&conn, 4).await.unwrap();
        // idempotent
        init_schema(&conn, 4).await.unwrap();

        assert_eq!(
            column_names(&conn, "profile").await,
            vec!["id", "key", "value", "updated_at"]
        );
        assert_eq!(
            column_names(&conn, "journal_entries").await,
            vec!["id", "content", "ai_response", "created_at"]
        );
        assert_eq!(
            column_names(&conn, "knowledge_graph").await,
            vec!["id", "entry_id", "tag_type", "tag_value", "created_at"]
        );
        assert!(column_names(&conn, "memories")
            .await
            .contains(&"embedding".to_string()));
    }

    #[tokio::test]
    async fn test_rebuild_memories_table_keeps_rows_and_clears_embeddings() {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        init_schema(&conn, 3).await.unwrap();

        conn.execute(
            "INSERT INTO memories (id, content, kind, categories, entry_id, embedding, created_at)
             VALUES ('m1', 'Had lunch with Mia', 'journal', '[]', 1, vector32('[0.1, 0.2, 0.3]'), '2024-01-01T00:00:00.000000Z')",
            (),
        )
        .await
        .unwrap();

        rebuild_memories_table(&conn, 5).await.unwrap();

        let mut rows = conn
            .query("SELECT content, embedding IS NULL FROM memories", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "Had lunch with Mia");
        assert_eq!(row.get::<i64>(1).unwrap(), 1);

        conn.execute(
            "UPDATE memories SET embedding = vector32('[0.1, 0.2, 0.3, 0.4, 0.5]') WHERE id = 'm1'",
            (),
        )
        .await
        .unwrap();
    }
}

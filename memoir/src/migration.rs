use std::io::{self, IsTerminal, Write};

use crate::db::traits::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;

const BACKFILL_BATCH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDecision {
    NotNeeded,
    Approved,
    Rejected,
}

/// Check if embedding dimensions are compatible with the database.
///
/// On a mismatch the rebuild flag approves the migration; otherwise an
/// interactive terminal is asked and anything else is rejected.
pub async fn check_dimension_compatibility(
    db: &dyn DatabaseBackend,
    provider: &EmbeddingProvider,
    force_rebuild: bool,
) -> Result<MigrationDecision> {
    let model_dimensions = provider.dimensions();
    let stored_dimensions = db.get_embedding_dimensions().await?;

    match stored_dimensions {
        None => {
            tracing::info!(
                dimensions = model_dimensions,
                "Fresh database, storing embedding dimensions"
            );
            db.set_embedding_dimensions(model_dimensions).await?;
            db.set_embedding_model(provider.model()).await?;
            Ok(MigrationDecision::NotNeeded)
        }
        Some(db_dims) if db_dims == model_dimensions => {
            tracing::info!(dimensions = model_dimensions, "Embedding dimensions match");
            Ok(MigrationDecision::NotNeeded)
        }
        Some(db_dims) => {
            tracing::warn!(
                database = db_dims,
                model = model_dimensions,
                "Embedding dimension mismatch"
            );

            if force_rebuild {
                tracing::info!("Rebuild flag set, proceeding with migration");
                return Ok(MigrationDecision::Approved);
            }

            if !io::stdin().is_terminal() {
                return Ok(MigrationDecision::Rejected);
            }

            print!(
                "\nEmbedding dimension mismatch detected!\n\
                 Database: {db_dims} dimensions\n\
                 Model: {model_dimensions} dimensions\n\n\
                 This requires re-embedding every diary memory.\n\
                 Proceed with migration? [y/N]: "
            );
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(MigrationDecision::Approved),
                _ => Ok(MigrationDecision::Rejected),
            }
        }
    }
}

/// Recreate the memory table at `new_dimensions` and re-embed every record.
pub async fn rebuild_embeddings(
    db: &dyn DatabaseBackend,
    provider: &EmbeddingProvider,
    new_dimensions: usize,
) -> Result<usize> {
    tracing::info!(
        dimensions = new_dimensions,
        "Starting re-embedding migration"
    );

    db.rebuild_memory_records(new_dimensions).await?;
    db.set_embedding_dimensions(new_dimensions).await?;
    db.set_embedding_model(provider.model()).await?;

    let embedded = embed_pending_records(db, provider).await?;
    tracing::info!(embedded, "Re-embedding migration complete");
    Ok(embedded)
}

/// Embed memory records that were stored without a vector.
///
/// Stops early if a batch fails, leaving the rest for the next start.
pub async fn embed_pending_records(
    db: &dyn DatabaseBackend,
    provider: &EmbeddingProvider,
) -> Result<usize> {
    let mut embedded = 0;

    loop {
        let pending = db.get_unembedded_memory_records(BACKFILL_BATCH).await?;
        if pending.is_empty() {
            break;
        }

        let texts: Vec<String> = pending.iter().map(|r| r.content.clone()).collect();
        let vectors = match provider.embed_passages(&texts).await {
            Ok(vectors) => vectors,
            Err(error) => {
                tracing::error!(error = %error, pending = pending.len(), "Backfill embedding failed");
                break;
            }
        };

        for (record, vector) in pending.iter().zip(vectors.iter()) {
            db.update_memory_record_embedding(&record.id, vector).await?;
        }
        embedded += pending.len();

        if pending.len() < BACKFILL_BATCH as usize {
            break;
        }
    }

    if embedded > 0 {
        tracing::info!(embedded, "Embedded pending memory records");
    }
    Ok(embedded)
}

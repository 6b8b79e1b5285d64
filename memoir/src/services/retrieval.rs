use std::sync::Arc;

use serde::Serialize;

use crate::db::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::models::{Era, MemoryHit};

/// Rendered in prompts when nothing in the diary relates to the question.
pub const NO_RELATED_MEMORIES: &str = "No related memories found in the diary.";

/// The outcome of a recall. An empty diary is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "memories", rename_all = "snake_case")]
pub enum Recall {
    Memories(Vec<MemoryHit>),
    NoRelatedMemories,
}

impl Recall {
    pub fn hits(&self) -> &[MemoryHit] {
        match self {
            Self::Memories(hits) => hits,
            Self::NoRelatedMemories => &[],
        }
    }

    /// One line per memory, or the sentinel.
    pub fn render(&self) -> String {
        match self {
            Self::Memories(hits) => hits
                .iter()
                .map(MemoryHit::prompt_line)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::NoRelatedMemories => NO_RELATED_MEMORIES.to_string(),
        }
    }
}

/// Semantic lookup over the diary's memory records.
#[derive(Clone)]
pub struct RetrievalService {
    db: Arc<dyn DatabaseBackend>,
    embeddings: EmbeddingProvider,
    top_k: usize,
    threshold: f32,
}

impl RetrievalService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        top_k: usize,
        threshold: f32,
    ) -> Self {
        Self {
            db,
            embeddings,
            top_k,
            threshold,
        }
    }

    /// The `k` records closest to `query`, defaulting to the configured k.
    pub async fn recall(&self, query: &str, k: Option<usize>) -> Result<Recall> {
        self.recall_within(query, k, &Era::default()).await
    }

    /// Like [`recall`](Self::recall), ranking only memories written during `era`.
    pub async fn recall_within(&self, query: &str, k: Option<usize>, era: &Era) -> Result<Recall> {
        let k = k.unwrap_or(self.top_k);
        if k == 0 || query.trim().is_empty() {
            return Ok(Recall::NoRelatedMemories);
        }

        if self.db.count_memory_records().await? == 0 {
            tracing::debug!("Recall on an empty diary");
            return Ok(Recall::NoRelatedMemories);
        }

        let embedding = self.embeddings.embed_query(query).await?;
        let limit = u32::try_from(k).unwrap_or(u32::MAX);
        let hits = self
            .db
            .search_similar_memory_records(&embedding, limit, self.threshold, era)
            .await?;

        tracing::debug!(k, found = hits.len(), bounded = !era.is_unbounded(), "Recall finished");

        if hits.is_empty() {
            Ok(Recall::NoRelatedMemories)
        } else {
            Ok(Recall::Memories(hits))
        }
    }
}

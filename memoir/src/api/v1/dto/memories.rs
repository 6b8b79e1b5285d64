//! Memory recall DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{MemoryHit, MemoryKind};
use crate::services::Recall;

/// Request body for `POST /api/v1/memories:search`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchMemoriesRequest {
    /// Free-text question, e.g. `Who is Mia?`.
    #[validate(length(max = 4000, message = "q must be at most 4000 characters"))]
    pub q: String,
    /// Number of memories to return. Defaults to the configured recall size.
    #[validate(range(max = 50, message = "limit must be at most 50"))]
    pub limit: Option<usize>,
}

/// A recalled memory record.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryResult {
    pub id: String,
    pub content: String,
    pub kind: MemoryKind,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<i64>,
    /// Cosine similarity to the query, 1.0 being identical.
    pub similarity: f32,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<MemoryHit> for MemoryResult {
    fn from(hit: MemoryHit) -> Self {
        Self {
            id: hit.record.id,
            content: hit.record.content,
            kind: hit.record.kind,
            categories: hit.record.categories,
            entry_id: hit.record.entry_id,
            similarity: hit.score,
            created_at: hit.record.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecallStatus {
    Memories,
    NoRelatedMemories,
}

/// Response for `POST /api/v1/memories:search`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchMemoriesResponse {
    pub status: RecallStatus,
    /// The recall as quoted to the past self: one line per memory, or the
    /// "no related memories" sentence.
    pub text: String,
    pub results: Vec<MemoryResult>,
}

impl From<Recall> for SearchMemoriesResponse {
    fn from(recall: Recall) -> Self {
        let text = recall.render();
        match recall {
            Recall::Memories(hits) => Self {
                status: RecallStatus::Memories,
                text,
                results: hits.into_iter().map(Into::into).collect(),
            },
            Recall::NoRelatedMemories => Self {
                status: RecallStatus::NoRelatedMemories,
                text,
                results: Vec::new(),
            },
        }
    }
}

//! Knowledge overview DTOs for the v1 API.

use serde::Serialize;

use crate::services::{KnowledgeOverview, TagGroup};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagGroupResponse {
    /// Display label of the tag type, e.g. `Person`.
    pub tag_type: String,
    pub values: Vec<String>,
}

/// Response for `GET /api/v1/knowledge`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeResponse {
    /// One line per tag type, as given to the diary's personas.
    pub summary: String,
    /// The most recent values per tag type.
    pub snapshot: Vec<TagGroupResponse>,
    pub entry_count: u64,
}

impl From<TagGroup> for TagGroupResponse {
    fn from(group: TagGroup) -> Self {
        Self {
            tag_type: group.tag_type,
            values: group.values,
        }
    }
}

impl From<KnowledgeOverview> for KnowledgeResponse {
    fn from(overview: KnowledgeOverview) -> Self {
        Self {
            summary: overview.summary,
            snapshot: overview.snapshot.into_iter().map(Into::into).collect(),
            entry_count: overview.entry_count,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What produced a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    #[default]
    Journal,
    DaySummary,
    GuidedReflection,
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Journal => write!(f, "journal"),
            Self::DaySummary => write!(f, "day_summary"),
            Self::GuidedReflection => write!(f, "guided_reflection"),
        }
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "journal" => Ok(Self::Journal),
            "day_summary" => Ok(Self::DaySummary),
            "guided_reflection" => Ok(Self::GuidedReflection),
            _ => Err(format!("Unknown memory kind: {s}")),
        }
    }
}

/// An embedded piece of diary text used for similarity recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub kind: MemoryKind,
    pub categories: Vec<String>,
    pub entry_id: Option<i64>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(content: impl Into<String>, kind: MemoryKind) -> Self {
        Self {
            id: nanoid::nanoid!(),
            content: content.into(),
            kind,
            categories: Vec::new(),
            entry_id: None,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_entry(mut self, entry_id: i64) -> Self {
        self.entry_id = Some(entry_id);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// `YYYY-MM-DD HH:MM`, the date metadata exposed on recall.
    pub fn date_label(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// A memory record returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryHit {
    pub record: MemoryRecord,
    pub score: f32,
}

impl MemoryHit {
    /// `- [date] (categories): content`, the line quoted in the past-self prompt.
    pub fn prompt_line(&self) -> String {
        let label = if self.record.categories.is_empty() {
            self.record.kind.to_string()
        } else {
            self.record.categories.join(", ")
        };
        format!(
            "- [{}] ({}): {}",
            self.record.date_label(),
            label,
            self.record.content
        )
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shown in place of the knowledge summary before any tag exists.
pub const EMPTY_KNOWLEDGE_SUMMARY: &str = "No memories recorded yet.";

/// The fixed taxonomy knowledge tags are classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TagType {
    Event,
    Entity,
    #[serde(rename = "Sentiment/Trigger")]
    SentimentTrigger,
    #[serde(rename = "Core Belief")]
    CoreBelief,
    Syntax,
}

impl TagType {
    pub const ALL: [TagType; 5] = [
        TagType::Event,
        TagType::Entity,
        TagType::SentimentTrigger,
        TagType::CoreBelief,
        TagType::Syntax,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Entity => "Entity",
            Self::SentimentTrigger => "Sentiment/Trigger",
            Self::CoreBelief => "Core Belief",
            Self::Syntax => "Syntax",
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TagType {
    type Err = String;

    /// Accepts the canonical labels plus the spellings models tend to produce
    /// (`sentiment-trigger`, `core_belief`, any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "event" => Ok(Self::Event),
            "entity" => Ok(Self::Entity),
            "sentimenttrigger" | "sentiment" => Ok(Self::SentimentTrigger),
            "corebelief" => Ok(Self::CoreBelief),
            "syntax" => Ok(Self::Syntax),
            _ => Err(format!("Unknown tag type: {s}")),
        }
    }
}

/// A tag about to be stored against an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewTag {
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub value: String,
}

impl NewTag {
    pub fn new(tag_type: TagType, value: impl Into<String>) -> Self {
        Self {
            tag_type,
            value: value.into(),
        }
    }
}

/// A stored knowledge tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeTag {
    pub id: i64,
    pub entry_id: i64,
    pub tag_type: String,
    pub tag_value: String,
    pub created_at: DateTime<Utc>,
}

/// Tags grouped by type. Types keep first-seen order, values are
/// deduplicated keeping first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeGraph {
    groups: Vec<(String, Vec<String>)>,
}

impl KnowledgeGraph {
    pub fn from_tags<'a, I>(tags: I) -> Self
    where
        I: IntoIterator<Item = &'a KnowledgeTag>,
    {
        let mut graph = Self::default();
        for tag in tags {
            graph.push(&tag.tag_type, &tag.tag_value);
        }
        graph
    }

    fn push(&mut self, tag_type: &str, value: &str) {
        let values = match self.groups.iter().position(|(t, _)| t == tag_type) {
            Some(idx) => &mut self.groups[idx].1,
            None => {
                self.groups.push((tag_type.to_string(), Vec::new()));
                let last = self.groups.len() - 1;
                &mut self.groups[last].1
            }
        };
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[(String, Vec<String>)] {
        &self.groups
    }

    /// One `[Type]: v1 | v2` line per type.
    pub fn summary(&self) -> String {
        if self.groups.is_empty() {
            return EMPTY_KNOWLEDGE_SUMMARY.to_string();
        }
        self.groups
            .iter()
            .map(|(tag_type, values)| format!("[{}]: {}", tag_type, values.join(" | ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The first `per_type` values of each type.
    pub fn snapshot(&self, per_type: usize) -> Vec<(String, Vec<String>)> {
        self.groups
            .iter()
            .map(|(t, values)| (t.clone(), values.iter().take(per_type).cloned().collect()))
            .collect()
    }
}

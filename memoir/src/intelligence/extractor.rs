use serde::Deserialize;

use crate::error::MemoirError;
use crate::llm::{prompts, strip_code_fence, CompletionOptions, LlmProvider};
use crate::models::{NewTag, TagType};

/// Outcome of asking the model for an entry's knowledge tags.
///
/// A failed extraction never blocks saving the entry; it just contributes no
/// tags.
#[derive(Debug, Clone, PartialEq)]
pub enum TagExtraction {
    Parsed(Vec<NewTag>),
    Fallback(String),
}

impl TagExtraction {
    pub fn tags(&self) -> &[NewTag] {
        match self {
            Self::Parsed(tags) => tags,
            Self::Fallback(_) => &[],
        }
    }

    pub fn into_tags(self) -> Vec<NewTag> {
        match self {
            Self::Parsed(tags) => tags,
            Self::Fallback(_) => Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(rename = "type")]
    tag_type: String,
    value: String,
}

/// Deterministic decoding for tag extraction.
const EXTRACTION_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: Some(0.0),
    max_tokens: None,
};

#[derive(Clone)]
pub struct TagExtractor {
    llm: LlmProvider,
}

impl TagExtractor {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, entry: &str) -> TagExtraction {
        if !self.llm.is_available() {
            tracing::warn!("LLM unavailable, skipping tag extraction");
            return TagExtraction::Fallback("LLM unavailable".to_string());
        }

        let prompt = prompts::tag_extraction_prompt(entry);
        match self.llm.complete(&prompt, Some(&EXTRACTION_OPTIONS)).await {
            Ok(raw) => parse_tags(&raw),
            Err(MemoirError::LlmUnavailable(reason)) => {
                tracing::warn!(%reason, "LLM unavailable during tag extraction");
                TagExtraction::Fallback(reason)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Tag extraction request failed");
                TagExtraction::Fallback(error.to_string())
            }
        }
    }
}

/// Decodes model output as a JSON array of `{"type", "value"}` objects.
///
/// Output that is not a JSON array is a fallback. Within the array, items of
/// the wrong shape, unknown tag types and blank values are dropped one by one.
pub fn parse_tags(raw: &str) -> TagExtraction {
    let items: Vec<serde_json::Value> = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(items) => items,
        Err(error) => {
            tracing::warn!(error = %error, "Model returned malformed tag JSON");
            return TagExtraction::Fallback(format!("Malformed tag output: {error}"));
        }
    };

    let tags = items
        .into_iter()
        .filter_map(|item| {
            let raw: RawTag = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::debug!(error = %error, "Dropping malformed tag item");
                    return None;
                }
            };
            let value = raw.value.trim();
            if value.is_empty() {
                return None;
            }
            match raw.tag_type.parse::<TagType>() {
                Ok(tag_type) => Some(NewTag::new(tag_type, value)),
                Err(reason) => {
                    tracing::debug!(%reason, "Dropping tag with unknown type");
                    None
                }
            }
        })
        .collect();

    TagExtraction::Parsed(tags)
}

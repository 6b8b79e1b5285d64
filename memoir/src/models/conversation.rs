use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The last `max_turns` turns of `history`, trimmed so it starts with a user turn.
///
/// Chat APIs reject histories that open with an assistant message.
pub fn recent_history(history: &[ChatTurn], max_turns: usize) -> &[ChatTurn] {
    let start = history.len().saturating_sub(max_turns);
    let window = &history[start..];
    match window.iter().position(|t| t.role == ChatRole::User) {
        Some(first_user) => &window[first_user..],
        None => &[],
    }
}

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use crate::error::MemoirError;
use crate::llm::LlmProvider;

use super::state::AppState;

pub const LLM_KEY_HEADER: &str = "x-api-key";

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(MemoirError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for MemoirError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> MemoirError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                MemoirError::Validation(format!("Missing required field: {field}"))
            } else {
                MemoirError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            MemoirError::Validation(format!("JSON syntax error: {err}"))
        }
        JsonRejection::MissingJsonContentType(_) => {
            MemoirError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            MemoirError::Validation("Failed to read request body".to_string())
        }
        _ => MemoirError::Validation(rejection.to_string()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

/// Model key sent with the request in the `X-Api-Key` header.
///
/// Separate from the bearer token that guards the API itself.
#[derive(Debug, Clone, Default)]
pub struct LlmKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for LlmKey {
    type Rejection = MemoirError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(LLM_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(Self(key))
    }
}

impl LlmKey {
    /// Picks the body key over the header key and resolves the model that
    /// serves this request. A model without a usable key is an error.
    pub fn resolve(
        &self,
        state: &AppState,
        body_key: Option<&str>,
    ) -> Result<LlmProvider, MemoirError> {
        let key = body_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.0.as_deref());
        let llm = state.llm.with_api_key(key);

        if llm.is_available() {
            Ok(llm)
        } else {
            let reason = match llm.backend() {
                crate::llm::LlmBackend::Unavailable { reason } => reason.clone(),
                _ => "LLM is not available".to_string(),
            };
            Err(MemoirError::LlmUnavailable(reason))
        }
    }
}

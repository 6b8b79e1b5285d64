use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::{parse_llm_provider_model, LlmConfig, KNOWN_LLM_PROVIDERS};
use crate::error::{MemoirError, Result};
use crate::llm::api::{provider_needs_api_key, LlmApiClient};
use crate::models::ChatTurn;

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// One conversational call: persona instructions, prior turns and the new
/// user message.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: Option<&'a str>,
    pub history: &'a [ChatTurn],
    pub message: &'a str,
    pub options: Option<&'a CompletionOptions>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            system: None,
            history: &[],
            message,
            options: None,
        }
    }

    pub fn system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn history(mut self, history: &'a [ChatTurn]) -> Self {
        self.history = history;
        self
    }

    pub fn options(mut self, options: &'a CompletionOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Clone)]
pub enum LlmBackend {
    Api(Arc<LlmApiClient>),
    Unavailable { reason: String },
}

/// The diary's language model. Requests can carry their own API key, so a
/// provider built without one may still be upgraded per call with
/// [`LlmProvider::with_api_key`].
#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: LlmConfig,
}

impl LlmProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let backend = Self::build_backend(config);
        Self {
            backend,
            config: config.clone(),
        }
    }

    fn build_backend(config: &LlmConfig) -> LlmBackend {
        let (provider, _) = parse_llm_provider_model(&config.model);
        let provider_lower = provider.to_lowercase();

        if !KNOWN_LLM_PROVIDERS.contains(&provider_lower.as_str()) && config.base_url.is_none() {
            return LlmBackend::Unavailable {
                reason: format!("Unknown LLM provider for model '{}'", config.model),
            };
        }

        if provider_needs_api_key(&config.model) && config.api_key.is_none() {
            return LlmBackend::Unavailable {
                reason: "No LLM API key configured".to_string(),
            };
        }

        match LlmApiClient::new(config) {
            Ok(client) => LlmBackend::Api(Arc::new(client)),
            Err(error) => LlmBackend::Unavailable {
                reason: error.to_string(),
            },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.into(),
            },
            config: LlmConfig::default(),
        }
    }

    /// A provider that authenticates with `api_key` instead of the configured
    /// one. Blank keys leave the provider unchanged.
    pub fn with_api_key(&self, api_key: Option<&str>) -> Self {
        match api_key.map(str::trim).filter(|key| !key.is_empty()) {
            Some(key) if self.config.api_key.as_deref() != Some(key) => {
                let config = LlmConfig {
                    api_key: Some(key.to_string()),
                    ..self.config.clone()
                };
                Self::new(&config)
            }
            _ => self.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, LlmBackend::Api(_))
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Options derived from configuration, used when a caller passes none.
    pub fn default_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.config.temperature,
            max_tokens: None,
        }
    }

    pub async fn chat(&self, request: ChatRequest<'_>) -> Result<String> {
        match &self.backend {
            LlmBackend::Api(client) => {
                let defaults = self.default_options();
                let request = if request.options.is_none() {
                    request.options(&defaults)
                } else {
                    request
                };
                client.chat(&request).await
            }
            LlmBackend::Unavailable { reason } => Err(MemoirError::LlmUnavailable(reason.clone())),
        }
    }

    /// Single-prompt completion with no history.
    pub async fn complete(&self, prompt: &str, options: Option<&CompletionOptions>) -> Result<String> {
        let mut request = ChatRequest::new(prompt);
        if let Some(options) = options {
            request = request.options(options);
        }
        self.chat(request).await
    }

    /// Completes `prompt` and decodes the reply as JSON, tolerating a
    /// markdown code fence around it.
    pub async fn complete_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<T> {
        let raw = self.complete(prompt, options).await?;
        serde_json::from_str(strip_code_fence(&raw)).map_err(|error| {
            MemoirError::Llm(format!("Failed to decode structured LLM output: {error}"))
        })
    }
}

/// Removes a surrounding ```json ... ``` fence if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_missing_key_makes_hosted_provider_unavailable() {
        let provider = LlmProvider::new(&config("gemini/gemini-2.0-flash", None));
        assert!(!provider.is_available());
    }

    #[test]
    fn test_request_key_upgrades_unavailable_provider() {
        let provider = LlmProvider::new(&config("gemini/gemini-2.0-flash", None));
        let keyed = provider.with_api_key(Some("request-key"));
        assert!(keyed.is_available());
        assert!(!provider.with_api_key(Some("  ")).is_available());
    }

    #[test]
    fn test_unknown_provider_without_base_url_is_unavailable() {
        let provider = LlmProvider::new(&config("mystery/model", Some("k")));
        match provider.backend() {
            LlmBackend::Unavailable { reason } => assert!(reason.contains("mystery")),
            LlmBackend::Api(_) => panic!("expected unavailable backend"),
        }
    }

    #[tokio::test]
    async fn test_unavailable_provider_reports_reason() {
        let provider = LlmProvider::unavailable("offline");
        let err = provider.complete("hello", None).await.unwrap_err();
        assert!(matches!(err, MemoirError::LlmUnavailable(ref reason) if reason == "offline"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  [] "), "[]");
    }
}

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MemoirError, Result};

/// Default OpenAI-compatible base URL for a provider prefix.
pub fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        "gemini" => "https://generativelanguage.googleapis.com/v1beta/openai",
        _ => "https://api.openai.com/v1",
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbeddingApiClient {
    client: Client,
    config: ApiConfig,
}

impl EmbeddingApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MemoirError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| MemoirError::Embedding(format!("Invalid API key header: {e}")))?,
            );
        }
        Ok(headers)
    }

    /// Embeds `texts`, returning vectors in input order.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
        };
        let headers = self.headers()?;
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tracing::debug!(attempt, ?delay, "Retrying embedding request");
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .headers(headers.clone())
                .json(&request)
                .send()
                .await;

            let resp = match response {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(MemoirError::Embedding(format!("Request failed: {e}")));
                    continue;
                }
            };

            let status = resp.status();
            if status.is_success() {
                let body: EmbeddingResponse = resp.json().await.map_err(|e| {
                    MemoirError::Embedding(format!("Failed to parse response: {e}"))
                })?;
                return Self::ordered(body, texts.len());
            }

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse().ok());
                    last_error = Some(MemoirError::ApiRateLimit { retry_after });
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(MemoirError::ApiAuth(body));
                }
                s if s.is_server_error() => {
                    let body = resp.text().await.unwrap_or_default();
                    last_error = Some(MemoirError::Embedding(format!(
                        "Server error {status}: {body}"
                    )));
                }
                _ => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(MemoirError::Embedding(format!("API error {status}: {body}")));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MemoirError::Embedding("Unknown error".to_string())))
    }

    fn ordered(body: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
        let mut data = body.data;
        if data.len() != expected {
            return Err(MemoirError::Embedding(format!(
                "Expected {expected} embeddings, got {}",
                data.len()
            )));
        }
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    pub async fn detect_dimensions(&self) -> Result<usize> {
        let embeddings = self.embed(&["dimension probe"]).await?;
        embeddings
            .first()
            .map(|e| e.len())
            .ok_or_else(|| MemoirError::Embedding("No embedding returned".to_string()))
    }
}

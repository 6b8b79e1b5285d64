#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use memoir::config::{DatabaseConfig, DiaryConfig, EmbeddingsConfig, LlmConfig};
use memoir::db::{Database, DatabaseBackend, LibSqlBackend};
use memoir::embeddings::EmbeddingProvider;
use memoir::llm::LlmProvider;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Words the fake embedding model understands, one dimension each. The
/// last dimension is a constant so no vector is ever all zeros.
const VOCABULARY: &[&str] = &["mia", "lunch", "job", "new", "work", "sister", "tired", "trip"];

pub const EMBEDDING_DIMS: usize = 9;

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut vector: Vec<f32> = VOCABULARY
        .iter()
        .map(|term| if words.contains(term) { 1.0 } else { 0.0 })
        .collect();
    vector.push(0.1);
    vector
}

/// Answers `/embeddings` with one keyword vector per input string.
pub struct KeywordEmbeddings;

impl Respond for KeywordEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let inputs: Vec<String> = match &body["input"] {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            serde_json::Value::String(single) => vec![single.clone()],
            _ => Vec::new(),
        };
        let data: Vec<serde_json::Value> = inputs
            .iter()
            .enumerate()
            .map(|(index, text)| json!({ "index": index, "embedding": keyword_vector(text) }))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

pub async fn embeddings_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(KeywordEmbeddings)
        .mount(&server)
        .await;
    server
}

pub fn embeddings_config(base_url: &str) -> EmbeddingsConfig {
    EmbeddingsConfig {
        model: "openai/text-embedding-3-small".to_string(),
        dimensions: EMBEDDING_DIMS,
        batch_size: 16,
        api_key: Some("test-embedding-key".to_string()),
        base_url: Some(base_url.to_string()),
        timeout_secs: 5,
        max_retries: 0,
    }
}

pub async fn embedding_provider(server: &MockServer) -> EmbeddingProvider {
    EmbeddingProvider::new_async(&embeddings_config(&server.uri()))
        .await
        .expect("embedding provider should start")
}

pub fn database_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("file:{}", dir.path().join("diary.db").display()),
        auth_token: None,
        local_path: None,
    }
}

/// Opens (or reopens) the diary database inside `dir`.
pub async fn open_backend(dir: &TempDir, dims: usize) -> Arc<dyn DatabaseBackend> {
    let db = Database::new(&database_config(dir), dims)
        .await
        .expect("database should open");
    Arc::new(LibSqlBackend::new(db))
}

pub fn diary_config() -> DiaryConfig {
    DiaryConfig {
        history_turns: 10,
        recall_top_k: 5,
        recall_threshold: 0.0,
        past_self_recent_entries: 20,
        reflection_rounds: 2,
        snapshot_values_per_type: 3,
        response_language: None,
        session_capacity: 16,
        session_idle_timeout_secs: 3600,
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

/// A chat model that answers tag-extraction prompts with `tags` and
/// everything else with `reply`.
pub struct ScriptedModel {
    pub reply: String,
    pub tags: String,
}

impl Respond for ScriptedModel {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body);
        let content = if body.contains("silent data structuring engine") {
            &self.tags
        } else {
            &self.reply
        };
        ResponseTemplate::new(200).set_body_json(completion_body(content))
    }
}

pub async fn llm_server(reply: &str, tags: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ScriptedModel {
            reply: reply.to_string(),
            tags: tags.to_string(),
        })
        .mount(&server)
        .await;
    server
}

pub fn llm_provider(server: &MockServer) -> LlmProvider {
    LlmProvider::new(&LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(server.uri()),
        timeout_secs: 5,
        max_retries: 0,
        temperature: None,
    })
}

/// The JSON bodies of every chat request the server received.
pub async fn chat_requests(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/chat/completions")
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

use super::api::{default_base_url, ApiConfig, EmbeddingApiClient};
use crate::config::{parse_provider_model, EmbeddingsConfig};
use crate::error::{MemoirError, Result};

#[derive(Clone)]
enum EmbeddingBackend {
    Local {
        model: Arc<Mutex<TextEmbedding>>,
        batch_size: usize,
    },
    Api {
        client: EmbeddingApiClient,
        batch_size: usize,
    },
}

/// Turns diary text into vectors, either with a local ONNX model or an
/// OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    model: String,
    dimensions: usize,
}

impl EmbeddingProvider {
    /// Sync constructor for local models only.
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model_name) = parse_provider_model(&config.model);

        if provider != "local" {
            return Err(MemoirError::Embedding(format!(
                "Embedding provider '{provider}' needs EmbeddingProvider::new_async",
            )));
        }

        Self::new_local(config, model_name)
    }

    /// Builds either backend. API backends probe the endpoint once to learn
    /// the vector width.
    pub async fn new_async(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model_name) = parse_provider_model(&config.model);

        if provider == "local" {
            let config = config.clone();
            let model_name = model_name.to_string();
            return tokio::task::spawn_blocking(move || Self::new_local(&config, &model_name))
                .await
                .map_err(|e| MemoirError::Embedding(format!("Embedding loader failed: {e}")))?;
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());
        let client = EmbeddingApiClient::new(ApiConfig {
            base_url,
            api_key: config.api_key.clone(),
            model: model_name.to_string(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })?;

        let dimensions = client.detect_dimensions().await?;
        if dimensions != config.dimensions {
            tracing::info!(
                configured = config.dimensions,
                detected = dimensions,
                "Using embedding width reported by the API"
            );
        }

        Ok(Self {
            backend: EmbeddingBackend::Api {
                client,
                batch_size: config.batch_size.max(1),
            },
            model: config.model.clone(),
            dimensions,
        })
    }

    fn new_local(config: &EmbeddingsConfig, model_name: &str) -> Result<Self> {
        let embedding_model = resolve_embedding_model(model_name);
        let model = Arc::new(Mutex::new(build_model(embedding_model)?));

        Ok(Self {
            backend: EmbeddingBackend::Local {
                model,
                batch_size: config.batch_size.max(1),
            },
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match &self.backend {
            EmbeddingBackend::Local { model, batch_size } => {
                let model = Arc::clone(model);
                let batch_size = *batch_size;
                tokio::task::spawn_blocking(move || {
                    let mut model = model.lock().map_err(|e| {
                        MemoirError::Embedding(format!("Embedding model lock poisoned: {e}"))
                    })?;
                    model
                        .embed(texts, Some(batch_size))
                        .map_err(|e| MemoirError::Embedding(e.to_string()))
                })
                .await
                .map_err(|e| MemoirError::Embedding(format!("Embedding worker failed: {e}")))?
            }
            EmbeddingBackend::Api { client, batch_size } => {
                let mut all = Vec::with_capacity(texts.len());
                for batch in texts.chunks(*batch_size) {
                    let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
                    all.extend(client.embed(&refs).await?);
                }
                Ok(all)
            }
        }
    }

    async fn embed_single(&self, text: String) -> Result<Vec<f32>> {
        self.embed(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoirError::Embedding("No embedding generated".to_string()))
    }

    /// Embeds a recall question.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        match &self.backend {
            // Local models use query: prefix
            EmbeddingBackend::Local { .. } => self.embed_single(format!("query: {query}")).await,
            EmbeddingBackend::Api { .. } => self.embed_single(query.to_string()).await,
        }
    }

    /// Embeds diary text that will be stored.
    pub async fn embed_passage(&self, passage: &str) -> Result<Vec<f32>> {
        match &self.backend {
            EmbeddingBackend::Local { .. } => {
                self.embed_single(format!("passage: {passage}")).await
            }
            EmbeddingBackend::Api { .. } => self.embed_single(passage.to_string()).await,
        }
    }

    pub async fn embed_passages(&self, passages: &[String]) -> Result<Vec<Vec<f32>>> {
        let texts = match &self.backend {
            EmbeddingBackend::Local { .. } => {
                passages.iter().map(|p| format!("passage: {p}")).collect()
            }
            EmbeddingBackend::Api { .. } => passages.to_vec(),
        };
        self.embed(texts).await
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn resolve_embedding_model(model_name: &str) -> EmbeddingModel {
    match model_name {
        "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "BAAI/bge-large-en-v1.5" | "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            EmbeddingModel::AllMiniLML6V2
        }
        "intfloat/multilingual-e5-small" | "multilingual-e5-small" => {
            EmbeddingModel::MultilingualE5Small
        }
        "intfloat/multilingual-e5-base" | "multilingual-e5-base" => {
            EmbeddingModel::MultilingualE5Base
        }
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            EmbeddingModel::NomicEmbedTextV15
        }
        other => {
            tracing::warn!(model = other, "Unknown local embedding model, using bge-small-en-v1.5");
            EmbeddingModel::BGESmallENV15
        }
    }
}

fn build_model(embedding_model: EmbeddingModel) -> Result<TextEmbedding> {
    TextEmbedding::try_new(InitOptions::new(embedding_model).with_show_download_progress(true))
        .map_err(|e| MemoirError::Embedding(e.to_string()))
}

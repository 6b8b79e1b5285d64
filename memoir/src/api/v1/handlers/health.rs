use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::config::parse_llm_provider_model;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub embeddings: EmbeddingsStatus,
    pub llm: LlmStatus,
    pub sessions: SessionsStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingsStatus {
    pub status: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    pub provider: String,
    pub model: String,
    /// Why the model cannot be used without a per-request key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SessionsStatus {
    pub active: usize,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let db_status = match state.db.sync().await {
        Ok(_) => DatabaseStatus {
            status: "ok".to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            DatabaseStatus {
                status: "error".to_string(),
            }
        }
    };

    let embeddings_status = EmbeddingsStatus {
        status: "ok".to_string(),
        model: state.embeddings.model().to_string(),
        dimensions: state.embeddings.dimensions(),
    };

    let (provider, _) = parse_llm_provider_model(state.llm.model());
    let llm_status = match state.llm.backend() {
        crate::llm::LlmBackend::Api(_) => LlmStatus {
            status: "available".to_string(),
            provider: provider.to_string(),
            model: state.llm.model().to_string(),
            reason: None,
        },
        crate::llm::LlmBackend::Unavailable { reason } => LlmStatus {
            status: "unavailable".to_string(),
            provider: provider.to_string(),
            model: state.llm.model().to_string(),
            reason: Some(reason.clone()),
        },
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        embeddings: embeddings_status,
        llm: llm_status,
        sessions: SessionsStatus {
            active: state.sessions.store().len(),
        },
    })
}

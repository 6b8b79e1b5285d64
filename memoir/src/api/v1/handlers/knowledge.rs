use axum::extract::State;

use crate::api::state::AppState;
use crate::api::v1::dto::KnowledgeResponse;
use crate::api::v1::response::ApiResponse;

/// `GET /api/v1/knowledge`
#[utoipa::path(
    get,
    path = "/api/v1/knowledge",
    tag = "knowledge",
    operation_id = "knowledge.get",
    responses(
        (status = 200, description = "Knowledge summary and snapshot", body = KnowledgeResponse),
    )
)]
pub async fn get_knowledge(State(state): State<AppState>) -> ApiResponse<KnowledgeResponse> {
    match state.diary.knowledge().await {
        Ok(overview) => ApiResponse::success(overview.into()),
        Err(e) => e.into(),
    }
}

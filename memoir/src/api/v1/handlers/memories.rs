//! v1 Memory recall handlers.

use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::state::AppState;
use crate::api::v1::dto::{validate_request, SearchMemoriesRequest, SearchMemoriesResponse};
use crate::api::v1::response::{ApiError, ApiResponse};

/// `POST /api/v1/memories:search`
///
/// Returns the memory records closest to `q`. An empty diary, or one with
/// nothing related, answers with the `no_related_memories` status.
#[utoipa::path(
    post,
    path = "/api/v1/memories:search",
    tag = "memories",
    operation_id = "memories.search",
    request_body = SearchMemoriesRequest,
    responses(
        (status = 200, description = "Recall result", body = SearchMemoriesResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn search_memories(
    State(state): State<AppState>,
    AppJson(req): AppJson<SearchMemoriesRequest>,
) -> ApiResponse<SearchMemoriesResponse> {
    if let Err(e) = validate_request(&req) {
        return e.into();
    }

    match state.diary.retrieval().recall(&req.q, req.limit).await {
        Ok(recall) => ApiResponse::success(recall.into()),
        Err(e) => e.into(),
    }
}

//! v1 Journal entry handlers.

use axum::extract::State;
use axum_extra::extract::Query;

use crate::api::state::AppState;
use crate::api::v1::dto::{validate_request, ListEntriesQuery, ListEntriesResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::models::Era;

/// `GET /api/v1/entries`
///
/// Lists every entry oldest first, optionally limited to a range of years.
#[utoipa::path(
    get,
    path = "/api/v1/entries",
    tag = "entries",
    operation_id = "entries.list",
    params(ListEntriesQuery),
    responses(
        (status = 200, description = "Entries listed", body = ListEntriesResponse),
        (status = 400, description = "Invalid year range", body = ApiError),
    )
)]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> ApiResponse<ListEntriesResponse> {
    let era = query.era();
    if let Err(e) = validate_request(&era) {
        return e.into();
    }
    let era = Era::from(era);

    match state.diary.entries(&era).await {
        Ok(entries) => {
            let total = entries.len() as u64;
            ApiResponse::success_with_meta(
                ListEntriesResponse::new(entries, &era),
                ResponseMeta { total: Some(total) },
            )
        }
        Err(e) => e.into(),
    }
}

//! v1 Profile handlers.

use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{validate_request, ProfileResponse, UpdateProfileRequest};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `GET /api/v1/profile`
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profile",
    operation_id = "profile.get",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
    )
)]
pub async fn get_profile(State(state): State<AppState>) -> ApiResponse<ProfileResponse> {
    match state.diary.profile().await {
        Ok(profile) => ApiResponse::success(profile.into()),
        Err(e) => e.into(),
    }
}

/// `PUT /api/v1/profile`
///
/// Writes every given pair in one transaction. Keys not mentioned keep
/// their values.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "profile",
    operation_id = "profile.update",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> ApiResponse<ProfileResponse> {
    if let Err(e) = validate_request(&req) {
        return e.into();
    }

    match state.diary.update_profile(&req.values).await {
        Ok(profile) => {
            tracing::info!(keys = req.values.len(), "Profile updated");
            ApiResponse::success(profile.into())
        }
        Err(e) => e.into(),
    }
}

//! # V1 API Key Authentication Middleware
//!
//! Guards every v1 route except the public ones (`/health`, `/openapi.json`,
//! `/docs`) with Bearer tokens listed in `MEMOIR_API_KEYS`. A diary that
//! configures no keys is open; startup logs a warning in that case.
//!
//! Errors use the v1 `ApiResponse` JSON envelope.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

/// Axum middleware that enforces Bearer token authentication for v1 API routes.
///
/// - No configured keys: the request passes through.
/// - Missing or malformed `Authorization: Bearer <token>` header: 401.
/// - Unknown token: 401.
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let keys = &state.config.server.api_keys;
    if keys.is_empty() {
        return next.run(request).await;
    }

    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "Missing or invalid authorization header. Expected: Bearer <token>",
        )
        .into_response();
    };

    if keys.iter().any(|key| key == bearer.token()) {
        next.run(request).await
    } else {
        tracing::debug!("Rejected request with unknown API key");
        ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key").into_response()
    }
}

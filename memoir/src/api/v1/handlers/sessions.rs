//! v1 Session handlers.
//!
//! Each action is checked against the session's phase; an action that does
//! not fit the phase answers 409 `conflict`. Actions that call the model
//! resolve the key from the body's `apiKey`, then the `X-Api-Key` header,
//! then the server configuration.

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::extractors::{AppJson, LlmKey};
use crate::api::state::AppState;
use crate::api::v1::dto::{
    validate_request, JournalRequest, JournalResponse, OnboardingAnswerRequest,
    OnboardingAnswerResponse, PastSelfRequest, PastSelfResponse, ReflectionAnswerRequest,
    ReflectionAnswerResponse, ReflectionProgressResponse, SessionResponse,
    StartReflectionRequest, SwitchModeRequest,
};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::error::MemoirError;
use crate::models::Era;

fn parse_session_id(raw: &str) -> Result<Uuid, MemoirError> {
    Uuid::parse_str(raw).map_err(|_| MemoirError::Validation(format!("Invalid session id: {raw}")))
}

/// `POST /api/v1/sessions`
///
/// Starts a session. It begins in onboarding until the profile is complete.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    operation_id = "sessions.create",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
    )
)]
pub async fn create_session(State(state): State<AppState>) -> ApiResponse<SessionResponse> {
    match state.sessions.create().await {
        Ok(snapshot) => ApiResponse::created(snapshot.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/sessions/{sessionId}`
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}",
    tag = "sessions",
    operation_id = "sessions.get",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<SessionResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    match state.sessions.snapshot(&id).await {
        Ok(snapshot) => ApiResponse::success(snapshot.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/consent`
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/consent",
    tag = "sessions",
    operation_id = "sessions.consent",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Consent recorded", body = SessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session is past onboarding", body = ApiError),
    )
)]
pub async fn give_consent(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<SessionResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    match state.sessions.give_consent(&id).await {
        Ok(snapshot) => ApiResponse::success(snapshot.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/onboarding`
///
/// Stores the answer to the current onboarding question. The last answer
/// completes onboarding and moves the session to journaling.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/onboarding",
    tag = "sessions",
    operation_id = "sessions.onboarding",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = OnboardingAnswerRequest,
    responses(
        (status = 200, description = "Answer stored", body = OnboardingAnswerResponse),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "No consent yet, or onboarding is over", body = ApiError),
    )
)]
pub async fn answer_onboarding(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<OnboardingAnswerRequest>,
) -> ApiResponse<OnboardingAnswerResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }

    match state.sessions.answer_onboarding(&id, &req.answer).await {
        Ok((progress, snapshot)) => {
            ApiResponse::success(OnboardingAnswerResponse::new(progress, snapshot))
        }
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/journal`
///
/// Saves an entry together with the diary's reply and the tags extracted
/// from it. A failed reply is stored as a placeholder, not an error.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/journal",
    tag = "sessions",
    operation_id = "sessions.journal",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = JournalRequest,
    responses(
        (status = 201, description = "Entry saved", body = JournalResponse),
        (status = 400, description = "Invalid request or no model key", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session is not journaling", body = ApiError),
    )
)]
pub async fn write_entry(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    key: LlmKey,
    AppJson(req): AppJson<JournalRequest>,
) -> ApiResponse<JournalResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }
    let llm = match key.resolve(&state, req.api_key.as_deref()) {
        Ok(llm) => llm,
        Err(e) => return e.into(),
    };

    match state.sessions.write_entry(&id, &llm, &req.content).await {
        Ok(saved) => ApiResponse::created(saved.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/mode`
///
/// Switches between journaling and the past self. The past self needs at
/// least one entry.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/mode",
    tag = "sessions",
    operation_id = "sessions.mode",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = SwitchModeRequest,
    responses(
        (status = 200, description = "Mode switched", body = SessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Switch not allowed", body = ApiError),
    )
)]
pub async fn switch_mode(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<SwitchModeRequest>,
) -> ApiResponse<SessionResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }

    let era = req.era.map(Era::from);
    match state.sessions.switch_mode(&id, req.mode, era).await {
        Ok(snapshot) => ApiResponse::success(snapshot.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/past-self`
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/past-self",
    tag = "sessions",
    operation_id = "sessions.pastSelf",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = PastSelfRequest,
    responses(
        (status = 200, description = "Past self replied", body = PastSelfResponse),
        (status = 400, description = "Invalid request or no model key", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session is not in past-self mode", body = ApiError),
    )
)]
pub async fn talk_to_past_self(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    key: LlmKey,
    AppJson(req): AppJson<PastSelfRequest>,
) -> ApiResponse<PastSelfResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }
    let llm = match key.resolve(&state, req.api_key.as_deref()) {
        Ok(llm) => llm,
        Err(e) => return e.into(),
    };

    match state.sessions.talk_to_past_self(&id, &llm, &req.message).await {
        Ok(reply) => ApiResponse::success(reply.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/reflection:start`
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/reflection:start",
    tag = "sessions",
    operation_id = "sessions.reflectionStart",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = StartReflectionRequest,
    responses(
        (status = 200, description = "First reflection question", body = ReflectionProgressResponse),
        (status = 400, description = "Invalid request or no model key", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "Session is not journaling", body = ApiError),
    )
)]
pub async fn start_reflection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    key: LlmKey,
    AppJson(req): AppJson<StartReflectionRequest>,
) -> ApiResponse<ReflectionProgressResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }
    let llm = match key.resolve(&state, req.api_key.as_deref()) {
        Ok(llm) => llm,
        Err(e) => return e.into(),
    };

    match state.sessions.start_reflection(&id, &llm, &req.summary).await {
        Ok(reflection) => ApiResponse::success(ReflectionProgressResponse::from(&reflection)),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/sessions/{sessionId}/reflection:answer`
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/reflection:answer",
    tag = "sessions",
    operation_id = "sessions.reflectionAnswer",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body = ReflectionAnswerRequest,
    responses(
        (status = 200, description = "Feedback and next question", body = ReflectionAnswerResponse),
        (status = 400, description = "Invalid request or no model key", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 409, description = "No reflection in progress", body = ApiError),
    )
)]
pub async fn answer_reflection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    key: LlmKey,
    AppJson(req): AppJson<ReflectionAnswerRequest>,
) -> ApiResponse<ReflectionAnswerResponse> {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    if let Err(e) = validate_request(&req) {
        return e.into();
    }
    let llm = match key.resolve(&state, req.api_key.as_deref()) {
        Ok(llm) => llm,
        Err(e) => return e.into(),
    };

    match state.sessions.answer_reflection(&id, &llm, &req.answer).await {
        Ok(step) => ApiResponse::success(step.into()),
        Err(e) => e.into(),
    }
}

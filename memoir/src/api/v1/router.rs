use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let sessions = Router::new()
        .route("/", post(handlers::sessions::create_session))
        .route("/{sessionId}", get(handlers::sessions::get_session))
        .route(
            "/{sessionId}/consent",
            post(handlers::sessions::give_consent),
        )
        .route(
            "/{sessionId}/onboarding",
            post(handlers::sessions::answer_onboarding),
        )
        .route("/{sessionId}/journal", post(handlers::sessions::write_entry))
        .route("/{sessionId}/mode", post(handlers::sessions::switch_mode))
        .route(
            "/{sessionId}/past-self",
            post(handlers::sessions::talk_to_past_self),
        )
        .route(
            "/{sessionId}/reflection:start",
            post(handlers::sessions::start_reflection),
        )
        .route(
            "/{sessionId}/reflection:answer",
            post(handlers::sessions::answer_reflection),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route("/entries", get(handlers::entries::list_entries))
        .route("/knowledge", get(handlers::knowledge::get_knowledge))
        .route(
            "/memories:search",
            post(handlers::memories::search_memories),
        )
        .nest("/sessions", sessions)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

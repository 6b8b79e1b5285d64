use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Memoir API",
        version = "1.0.0",
        description = "A self-hosted digital diary that remembers what you write and lets you talk with your past self.",
    ),
    paths(
        handlers::health::health_check,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::entries::list_entries,
        handlers::knowledge::get_knowledge,
        handlers::memories::search_memories,
        handlers::sessions::create_session,
        handlers::sessions::get_session,
        handlers::sessions::give_consent,
        handlers::sessions::answer_onboarding,
        handlers::sessions::write_entry,
        handlers::sessions::switch_mode,
        handlers::sessions::talk_to_past_self,
        handlers::sessions::start_reflection,
        handlers::sessions::answer_reflection,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Common
        dto::common::EraDto,
        // Profile
        dto::profile::UpdateProfileRequest,
        dto::profile::ProfileResponse,
        dto::profile::OnboardingQuestionResponse,
        // Entries
        dto::entries::ListEntriesQuery,
        dto::entries::EntryResponse,
        dto::entries::DateRangeResponse,
        dto::entries::ListEntriesResponse,
        // Knowledge
        dto::knowledge::TagGroupResponse,
        dto::knowledge::KnowledgeResponse,
        // Memories
        dto::memories::SearchMemoriesRequest,
        dto::memories::SearchMemoriesResponse,
        dto::memories::MemoryResult,
        dto::memories::RecallStatus,
        // Sessions
        dto::sessions::OnboardingAnswerRequest,
        dto::sessions::JournalRequest,
        dto::sessions::SwitchModeRequest,
        dto::sessions::PastSelfRequest,
        dto::sessions::StartReflectionRequest,
        dto::sessions::ReflectionAnswerRequest,
        dto::sessions::SessionResponse,
        dto::sessions::OnboardingAnswerResponse,
        dto::sessions::JournalResponse,
        dto::sessions::PastSelfResponse,
        dto::sessions::ReflectionProgressResponse,
        dto::sessions::ReflectionAnswerResponse,
        // Domain types on the wire
        crate::session::Phase,
        crate::session::Mode,
        crate::models::ChatTurn,
        crate::models::ChatRole,
        crate::models::NewTag,
        crate::models::TagType,
        crate::models::MemoryKind,
        crate::intelligence::ReflectionQuestion,
        crate::intelligence::QuestionKind,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::EmbeddingsStatus,
        handlers::health::LlmStatus,
        handlers::health::SessionsStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "profile", description = "Profile key/value pairs and onboarding state"),
        (name = "entries", description = "Journal entries"),
        (name = "knowledge", description = "Knowledge tags extracted from entries"),
        (name = "memories", description = "Semantic recall over the diary"),
        (name = "sessions", description = "Onboarding, journaling, past-self chat and guided reflection"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}

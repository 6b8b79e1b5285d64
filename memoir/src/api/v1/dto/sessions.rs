//! Session DTOs for the v1 API.
//!
//! A session walks through onboarding, then alternates between journaling
//! and talking to the past self. Every action endpoint takes an optional
//! `apiKey` that overrides the server's model key for that request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::intelligence::ReflectionQuestion;
use crate::models::{ChatTurn, NewTag};
use crate::services::{
    OnboardingProgress, PastSelfReply, ReflectionState, ReflectionStep, SavedEntry,
    SessionSnapshot,
};
use crate::session::{Mode, Phase};

use super::common::EraDto;
use super::entries::EntryResponse;
use super::memories::SearchMemoriesResponse;
use super::profile::OnboardingQuestionResponse;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/sessions/{sessionId}/onboarding`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingAnswerRequest {
    #[validate(length(min = 1, max = 10000, message = "answer must be 1-10000 characters"))]
    pub answer: String,
}

/// Request body for `POST /api/v1/sessions/{sessionId}/journal`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalRequest {
    #[validate(length(min = 1, max = 50000, message = "content must be 1-50000 characters"))]
    pub content: String,
    /// Model key for this request only.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Request body for `POST /api/v1/sessions/{sessionId}/mode`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchModeRequest {
    pub mode: Mode,
    /// Restricts what the past self remembers. Ignored for journaling.
    #[serde(default)]
    #[validate(nested)]
    pub era: Option<EraDto>,
}

/// Request body for `POST /api/v1/sessions/{sessionId}/past-self`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PastSelfRequest {
    #[validate(length(min = 1, max = 10000, message = "message must be 1-10000 characters"))]
    pub message: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Request body for `POST /api/v1/sessions/{sessionId}/reflection:start`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartReflectionRequest {
    /// Free-form summary of the day.
    #[validate(length(min = 1, max = 20000, message = "summary must be 1-20000 characters"))]
    pub summary: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Request body for `POST /api/v1/sessions/{sessionId}/reflection:answer`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionAnswerRequest {
    #[validate(length(min = 1, max = 10000, message = "answer must be 1-10000 characters"))]
    pub answer: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionProgressResponse {
    pub question: ReflectionQuestion,
    pub round: usize,
    pub rounds: usize,
}

impl From<&ReflectionState> for ReflectionProgressResponse {
    fn from(state: &ReflectionState) -> Self {
        Self {
            question: state.current.clone(),
            round: state.round,
            rounds: state.rounds,
        }
    }
}

/// Session view returned by every session endpoint that changes phase.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[schema(value_type = String)]
    pub session_id: Uuid,
    pub phase: Phase,
    /// Whether the writer has agreed to have their entries stored.
    pub consent: bool,
    /// The question to answer next, while onboarding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_question: Option<OnboardingQuestionResponse>,
    pub journaling_history: Vec<ChatTurn>,
    pub past_self_history: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub era: Option<EraDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection: Option<ReflectionProgressResponse>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub last_active: DateTime<Utc>,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        let SessionSnapshot { session, profile } = snapshot;
        let onboarding_question = if session.phase == Phase::Onboarding && profile.has_consent() {
            profile.next_onboarding_question().map(Into::into)
        } else {
            None
        };

        Self {
            session_id: session.id,
            phase: session.phase,
            consent: profile.has_consent(),
            onboarding_question,
            reflection: session.reflection.as_ref().map(Into::into),
            journaling_history: session.journaling_history,
            past_self_history: session.past_self_history,
            era: session.era.map(Into::into),
            created_at: session.created_at,
            last_active: session.last_active,
        }
    }
}

/// Response for `POST /api/v1/sessions/{sessionId}/onboarding`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingAnswerResponse {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<OnboardingQuestionResponse>,
    pub session: SessionResponse,
}

impl OnboardingAnswerResponse {
    pub fn new(progress: OnboardingProgress, snapshot: SessionSnapshot) -> Self {
        let (complete, next_question) = match progress {
            OnboardingProgress::Next(question) => (false, Some(question.into())),
            OnboardingProgress::Complete => (true, None),
        };
        Self {
            complete,
            next_question,
            session: snapshot.into(),
        }
    }
}

/// Response for `POST /api/v1/sessions/{sessionId}/journal`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub entry: EntryResponse,
    /// The diary's reply to the entry.
    pub reply: String,
    /// Knowledge tags extracted from the entry.
    pub tags: Vec<NewTag>,
    /// Set when tag extraction failed and no tags were stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_fallback: Option<String>,
}

impl From<SavedEntry> for JournalResponse {
    fn from(saved: SavedEntry) -> Self {
        Self {
            reply: saved.entry.ai_response.clone().unwrap_or_default(),
            entry: saved.entry.into(),
            tags: saved.tags,
            extraction_fallback: saved.extraction_fallback,
        }
    }
}

/// Response for `POST /api/v1/sessions/{sessionId}/past-self`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PastSelfResponse {
    pub reply: String,
    /// The memories the reply was grounded on.
    pub recall: SearchMemoriesResponse,
}

impl From<PastSelfReply> for PastSelfResponse {
    fn from(reply: PastSelfReply) -> Self {
        Self {
            reply: reply.reply,
            recall: reply.recall.into(),
        }
    }
}

/// Response for `POST /api/v1/sessions/{sessionId}/reflection:answer`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionAnswerResponse {
    pub feedback: String,
    /// Absent once the reflection is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<ReflectionQuestion>,
    pub finished: bool,
}

impl From<ReflectionStep> for ReflectionAnswerResponse {
    fn from(step: ReflectionStep) -> Self {
        Self {
            feedback: step.feedback,
            finished: step.next.is_none(),
            next_question: step.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::dto::validate_request;
    use crate::models::{keys, Profile};
    use crate::session::SessionContext;

    #[test]
    fn onboarding_session_shows_question_after_consent() {
        let snapshot = SessionSnapshot {
            session: SessionContext::new(Phase::Onboarding),
            profile: Profile::from_pairs([(keys::CONSENT, "true")]),
        };
        let json = serde_json::to_value(SessionResponse::from(snapshot)).expect("serialize");
        assert_eq!(json["phase"], "onboarding");
        assert_eq!(json["consent"], true);
        assert_eq!(json["onboardingQuestion"]["step"], 1);
        assert!(json.get("sessionId").is_some());
    }

    #[test]
    fn onboarding_session_without_consent_hides_question() {
        let snapshot = SessionSnapshot {
            session: SessionContext::new(Phase::Onboarding),
            profile: Profile::new(),
        };
        let resp = SessionResponse::from(snapshot);
        assert!(!resp.consent);
        assert!(resp.onboarding_question.is_none());
    }

    #[test]
    fn switch_mode_accepts_snake_case_mode_and_era() {
        let req: SwitchModeRequest = serde_json::from_str(
            r#"{"mode": "past_self", "era": {"yearStart": 2019, "yearEnd": 2020}}"#,
        )
        .expect("deserialize");
        assert_eq!(req.mode, Mode::PastSelf);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn switch_mode_rejects_reversed_era() {
        let req: SwitchModeRequest = serde_json::from_str(
            r#"{"mode": "past_self", "era": {"yearStart": 2021, "yearEnd": 2019}}"#,
        )
        .expect("deserialize");
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn empty_journal_content_is_rejected() {
        let req: JournalRequest = serde_json::from_str(r#"{"content": ""}"#).expect("deserialize");
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("content must be 1-50000 characters"));
        assert!(req.api_key.is_none());
    }

    #[test]
    fn finished_reflection_has_no_next_question() {
        let resp = ReflectionAnswerResponse::from(ReflectionStep {
            feedback: "Thanks for sharing.".to_string(),
            next: None,
        });
        assert!(resp.finished);
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("nextQuestion").is_none());
    }
}

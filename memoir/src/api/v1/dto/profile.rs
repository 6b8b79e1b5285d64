//! Profile request/response DTOs for the v1 API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{OnboardingQuestion, Profile, ONBOARDING_QUESTIONS};

/// Request body for `PUT /api/v1/profile`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Key/value pairs to write. Existing keys are overwritten, others kept.
    #[validate(custom(function = "validate_profile_values"))]
    pub values: BTreeMap<String, String>,
}

fn validate_profile_values(values: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if values.is_empty() {
        let mut error = ValidationError::new("empty_values");
        error.message = Some("values must contain at least one key".into());
        return Err(error);
    }
    if values.keys().any(|key| key.trim().is_empty() || key.len() > 64) {
        let mut error = ValidationError::new("invalid_key");
        error.message = Some("Profile keys must be 1-64 characters".into());
        return Err(error);
    }
    Ok(())
}

/// A fixed onboarding question as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingQuestionResponse {
    pub step: usize,
    pub total_steps: usize,
    pub key: String,
    pub prompt: String,
}

impl From<&OnboardingQuestion> for OnboardingQuestionResponse {
    fn from(question: &OnboardingQuestion) -> Self {
        Self {
            step: question.step,
            total_steps: ONBOARDING_QUESTIONS.len(),
            key: question.key.to_string(),
            prompt: question.prompt.to_string(),
        }
    }
}

/// Profile response for `GET`/`PUT /api/v1/profile`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub values: BTreeMap<String, String>,
    /// Whether onboarding has been completed.
    pub complete: bool,
    pub consent: bool,
    /// The next onboarding question, while onboarding is unfinished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<OnboardingQuestionResponse>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let next_question = if profile.is_complete() {
            None
        } else {
            profile.next_onboarding_question().map(Into::into)
        };
        Self {
            complete: profile.is_complete(),
            consent: profile.has_consent(),
            next_question,
            values: profile.as_map().clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::intelligence::responder::failure_placeholder;
use crate::llm::{prompts, LlmProvider};
use crate::models::Profile;

/// Asked when the model does not produce a usable question.
pub const FALLBACK_QUESTION: &str = "Changing the subject a little, what else stood out about today?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Open,
    Choice,
}

/// One guided-reflection question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReflectionQuestion {
    #[serde(default)]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ReflectionQuestion {
    pub fn fallback() -> Self {
        Self {
            kind: QuestionKind::Open,
            question: FALLBACK_QUESTION.to_string(),
            options: Vec::new(),
        }
    }

    /// Choice questions without options degrade to open ones.
    fn normalized(mut self) -> Option<Self> {
        self.question = self.question.trim().to_string();
        if self.question.is_empty() {
            return None;
        }
        self.options = self
            .options
            .into_iter()
            .map(|option| option.trim().to_string())
            .filter(|option| !option.is_empty())
            .collect();
        if self.options.is_empty() {
            self.kind = QuestionKind::Open;
        }
        if self.kind == QuestionKind::Open {
            self.options.clear();
        }
        Some(self)
    }
}

/// Interviews the writer about their day, one question at a time.
#[derive(Clone)]
pub struct Interviewer {
    llm: LlmProvider,
    language: Option<String>,
}

impl Interviewer {
    pub fn new(llm: LlmProvider, language: Option<String>) -> Self {
        Self { llm, language }
    }

    pub async fn next_question(&self, profile: &Profile, transcript: &[String]) -> ReflectionQuestion {
        let prompt =
            prompts::reflection_question_prompt(profile, transcript, self.language.as_deref());

        match self
            .llm
            .complete_structured::<ReflectionQuestion>(&prompt, None)
            .await
        {
            Ok(question) => question.normalized().unwrap_or_else(|| {
                tracing::warn!("Model returned an empty reflection question");
                ReflectionQuestion::fallback()
            }),
            Err(error) => {
                tracing::warn!(error = %error, "Falling back to default reflection question");
                ReflectionQuestion::fallback()
            }
        }
    }

    /// One validating sentence about the latest answer.
    pub async fn feedback(&self, transcript: &[String]) -> String {
        let prompt = prompts::reflection_feedback_prompt(transcript, self.language.as_deref());
        match self.llm.complete(&prompt, None).await {
            Ok(feedback) => feedback.trim().to_string(),
            Err(error) => {
                tracing::error!(error = %error, "Reflection feedback failed");
                failure_placeholder(&error)
            }
        }
    }
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{MemoirError, Result};
use crate::intelligence::{Interviewer, ReflectionQuestion};
use crate::llm::LlmProvider;
use crate::models::MemoryKind;
use crate::services::diary::DiaryService;

/// A guided reflection in progress.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReflectionState {
    /// `User: ...` / `AI: ...` lines fed back into every prompt.
    pub transcript: Vec<String>,
    pub current: ReflectionQuestion,
    /// Questions asked so far, including the current one.
    pub round: usize,
    pub rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReflectionStep {
    pub feedback: String,
    /// `None` once the last round has been answered.
    pub next: Option<ReflectionQuestion>,
}

/// Interviews the writer after a free-form day summary, storing the summary
/// and every question/answer pair as memory records.
#[derive(Clone)]
pub struct ReflectionService {
    diary: DiaryService,
}

impl ReflectionService {
    pub fn new(diary: DiaryService) -> Self {
        Self { diary }
    }

    fn interviewer(&self, llm: &LlmProvider) -> Interviewer {
        Interviewer::new(llm.clone(), self.diary.config().response_language.clone())
    }

    pub async fn start(&self, llm: &LlmProvider, summary: &str) -> Result<ReflectionState> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(MemoirError::Validation(
                "Day summary cannot be empty".to_string(),
            ));
        }

        let rounds = self.diary.config().reflection_rounds.max(1);
        let profile = self.diary.profile().await?;

        self.diary
            .remember(
                &format!("Day summary: {summary}"),
                MemoryKind::DaySummary,
                Vec::new(),
                None,
            )
            .await?;

        let mut transcript = vec![format!("User: {summary}")];
        let question = self.interviewer(llm).next_question(&profile, &transcript).await;
        transcript.push(format!("AI: {}", question.question));

        tracing::info!(rounds, "Guided reflection started");

        Ok(ReflectionState {
            transcript,
            current: question,
            round: 1,
            rounds,
        })
    }

    /// Records the answer to the current question, then returns feedback and
    /// the next question while rounds remain.
    pub async fn answer(
        &self,
        llm: &LlmProvider,
        state: &mut ReflectionState,
        answer: &str,
    ) -> Result<ReflectionStep> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(MemoirError::Validation("Answer cannot be empty".to_string()));
        }

        self.diary
            .remember(
                &format!("Question: {} | Answer: {answer}", state.current.question),
                MemoryKind::GuidedReflection,
                Vec::new(),
                None,
            )
            .await?;
        state.transcript.push(format!("User: {answer}"));

        let interviewer = self.interviewer(llm);
        let feedback = interviewer.feedback(&state.transcript).await;

        if state.round >= state.rounds {
            tracing::info!(rounds = state.rounds, "Guided reflection finished");
            return Ok(ReflectionStep {
                feedback,
                next: None,
            });
        }

        let profile = self.diary.profile().await?;
        let next = interviewer.next_question(&profile, &state.transcript).await;
        state.transcript.push(format!("AI: {}", next.question));
        state.current = next.clone();
        state.round += 1;

        Ok(ReflectionStep {
            feedback,
            next: Some(next),
        })
    }
}

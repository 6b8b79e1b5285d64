use crate::error::MemoirError;
use crate::llm::{prompts, ChatRequest, LlmProvider};
use crate::models::{recent_history, ChatTurn, Profile};

/// Inline text stored as the reply when generation fails.
pub fn failure_placeholder(error: &MemoirError) -> String {
    format!("*(Something went wrong: {error})*")
}

/// Generates the two conversational personas' replies.
///
/// Replies never fail: an LLM error becomes [`failure_placeholder`] so the
/// entry or chat turn is still recorded.
#[derive(Clone)]
pub struct Responder {
    llm: LlmProvider,
    history_turns: usize,
    language: Option<String>,
}

impl Responder {
    pub fn new(llm: LlmProvider, history_turns: usize, language: Option<String>) -> Self {
        Self {
            llm,
            history_turns,
            language,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub async fn journaling_reply(
        &self,
        profile: &Profile,
        knowledge_summary: &str,
        history: &[ChatTurn],
        entry: &str,
    ) -> String {
        let system =
            prompts::journaling_system_prompt(profile, knowledge_summary, self.language());
        self.reply(&system, history, entry, "journaling").await
    }

    pub async fn past_self_reply(
        &self,
        context: &prompts::PastSelfContext<'_>,
        history: &[ChatTurn],
        message: &str,
    ) -> String {
        let system = prompts::past_self_system_prompt(context);
        self.reply(&system, history, message, "past_self").await
    }

    async fn reply(&self, system: &str, history: &[ChatTurn], message: &str, persona: &str) -> String {
        let history = recent_history(history, self.history_turns);
        let request = ChatRequest::new(message).system(system).history(history);

        match self.llm.chat(request).await {
            Ok(reply) => reply.trim().to_string(),
            Err(error) => {
                tracing::error!(persona, error = %error, "Reply generation failed");
                failure_placeholder(&error)
            }
        }
    }
}

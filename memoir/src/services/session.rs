use uuid::Uuid;

use crate::error::{MemoirError, Result};
use crate::llm::LlmProvider;
use crate::models::{Era, Profile};
use crate::services::diary::{DiaryService, OnboardingProgress, PastSelfReply, SavedEntry};
use crate::services::reflection::{ReflectionService, ReflectionState, ReflectionStep};
use crate::session::{Mode, Phase, SessionContext, SessionStore, SharedSession};

/// A session together with the profile it was evaluated against.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: SessionContext,
    pub profile: Profile,
}

/// Drives sessions through their phases and dispatches each action to the
/// diary. Every action is checked against the session's current phase.
#[derive(Clone)]
pub struct SessionService {
    diary: DiaryService,
    reflection: ReflectionService,
    store: SessionStore,
}

impl SessionService {
    pub fn new(diary: DiaryService, store: SessionStore) -> Self {
        let reflection = ReflectionService::new(diary.clone());
        Self {
            diary,
            reflection,
            store,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn shared(&self, id: &Uuid) -> Result<SharedSession> {
        self.store
            .get(id)
            .ok_or_else(|| MemoirError::NotFound(format!("Session {id} not found")))
    }

    /// Onboarding finished elsewhere (another session, a profile write)
    /// releases this session too.
    fn catch_up(session: &mut SessionContext, profile: &Profile) {
        if session.phase == Phase::Onboarding && profile.is_complete() {
            session.enter_journaling();
        }
    }

    pub async fn create(&self) -> Result<SessionSnapshot> {
        let profile = self.diary.settled_profile().await?;
        let session = SessionContext::new(Phase::initial(profile.is_complete()));
        tracing::info!(session_id = %session.id, phase = %session.phase, "Session created");

        let snapshot = SessionSnapshot {
            session: session.clone(),
            profile,
        };
        self.store.insert(session);
        Ok(snapshot)
    }

    pub async fn snapshot(&self, id: &Uuid) -> Result<SessionSnapshot> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        let profile = self.diary.settled_profile().await?;
        Self::catch_up(&mut session, &profile);

        Ok(SessionSnapshot {
            session: session.clone(),
            profile,
        })
    }

    pub async fn give_consent(&self, id: &Uuid) -> Result<SessionSnapshot> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::Onboarding, "give consent")?;

        self.diary.give_consent().await?;
        tracing::info!(session_id = %id, "Consent given");

        let profile = self.diary.settled_profile().await?;
        Self::catch_up(&mut session, &profile);
        Ok(SessionSnapshot {
            session: session.clone(),
            profile,
        })
    }

    pub async fn answer_onboarding(
        &self,
        id: &Uuid,
        answer: &str,
    ) -> Result<(OnboardingProgress, SessionSnapshot)> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::Onboarding, "answer onboarding")?;

        let progress = self.diary.answer_onboarding(answer).await?;
        if progress == OnboardingProgress::Complete {
            session.phase = session.phase.finish_onboarding()?;
            session.journaling_history.clear();
        }

        let profile = self.diary.settled_profile().await?;
        Ok((
            progress,
            SessionSnapshot {
                session: session.clone(),
                profile,
            },
        ))
    }

    pub async fn write_entry(
        &self,
        id: &Uuid,
        llm: &LlmProvider,
        content: &str,
    ) -> Result<SavedEntry> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::Journaling, "write a journal entry")?;

        let saved = self
            .diary
            .write_entry(llm, &session.journaling_history, content)
            .await?;

        let reply = saved.entry.ai_response.clone().unwrap_or_default();
        session.record_journaling(&saved.entry.content, &reply);
        Ok(saved)
    }

    pub async fn switch_mode(
        &self,
        id: &Uuid,
        mode: Mode,
        era: Option<Era>,
    ) -> Result<SessionSnapshot> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();

        let profile = self.diary.settled_profile().await?;
        Self::catch_up(&mut session, &profile);

        let entry_count = self.diary.entry_count().await?;
        let next = session.phase.switch_to(mode, entry_count)?;
        match next {
            Phase::PastSelf => session.enter_past_self(era),
            _ => session.enter_journaling(),
        }
        tracing::info!(session_id = %id, phase = %session.phase, "Mode switched");

        Ok(SessionSnapshot {
            session: session.clone(),
            profile,
        })
    }

    pub async fn talk_to_past_self(
        &self,
        id: &Uuid,
        llm: &LlmProvider,
        message: &str,
    ) -> Result<PastSelfReply> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::PastSelf, "talk to your past self")?;

        let reply = self
            .diary
            .talk_to_past_self(
                llm,
                &session.past_self_history,
                session.era.as_ref(),
                message,
            )
            .await?;

        session.record_past_self(message.trim(), &reply.reply);
        Ok(reply)
    }

    /// Begins a guided reflection, replacing one already in progress.
    pub async fn start_reflection(
        &self,
        id: &Uuid,
        llm: &LlmProvider,
        summary: &str,
    ) -> Result<ReflectionState> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::Journaling, "start a reflection")?;

        let state = self.reflection.start(llm, summary).await?;
        session.reflection = Some(state.clone());
        Ok(state)
    }

    pub async fn answer_reflection(
        &self,
        id: &Uuid,
        llm: &LlmProvider,
        answer: &str,
    ) -> Result<ReflectionStep> {
        let shared = self.shared(id)?;
        let mut session = shared.lock().await;
        session.touch();
        session.phase.require(Phase::Journaling, "answer a reflection")?;

        let mut state = session.reflection.clone().ok_or_else(|| {
            MemoirError::Conflict("No guided reflection in progress".to_string())
        })?;

        let step = self.reflection.answer(llm, &mut state, answer).await?;
        session.reflection = step.next.is_some().then_some(state);
        Ok(step)
    }
}

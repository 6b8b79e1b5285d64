use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::services::{DiaryService, SessionService};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub embeddings: EmbeddingProvider,
    /// Server-wide model; requests may swap in their own key.
    pub llm: LlmProvider,
    pub diary: DiaryService,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);
        let diary = DiaryService::new(db.clone(), embeddings.clone(), config.diary.clone());
        let store = SessionStore::new(
            config.diary.session_capacity,
            config.diary.session_idle_timeout_secs,
        );
        let sessions = SessionService::new(diary.clone(), store);

        Self {
            config,
            db,
            embeddings,
            llm,
            diary,
            sessions,
        }
    }
}

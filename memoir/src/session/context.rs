use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ChatTurn, Era};
use crate::services::ReflectionState;
use crate::session::phase::Phase;

/// Everything a single diary session remembers between requests.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub phase: Phase,
    pub journaling_history: Vec<ChatTurn>,
    pub past_self_history: Vec<ChatTurn>,
    pub era: Option<Era>,
    pub reflection: Option<ReflectionState>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(phase: Phase) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phase,
            journaling_history: Vec::new(),
            past_self_history: Vec::new(),
            era: None,
            reflection: None,
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn enter_journaling(&mut self) {
        self.phase = Phase::Journaling;
    }

    /// Past-self conversations always start fresh.
    pub fn enter_past_self(&mut self, era: Option<Era>) {
        self.phase = Phase::PastSelf;
        self.past_self_history.clear();
        self.era = era.filter(|era| !era.is_unbounded() || era.label.is_some());
        self.reflection = None;
    }

    pub fn record_journaling(&mut self, entry: &str, reply: &str) {
        self.journaling_history.push(ChatTurn::user(entry));
        self.journaling_history.push(ChatTurn::assistant(reply));
    }

    pub fn record_past_self(&mut self, message: &str, reply: &str) {
        self.past_self_history.push(ChatTurn::user(message));
        self.past_self_history.push(ChatTurn::assistant(reply));
    }
}

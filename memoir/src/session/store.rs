use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use lru::LruCache;
use uuid::Uuid;

use crate::session::context::SessionContext;

/// A session shared between requests. The async lock serializes actions
/// within one session without blocking others.
pub type SharedSession = Arc<tokio::sync::Mutex<SessionContext>>;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Bounded in-memory session registry; the least recently used session is
/// evicted when full.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<LruCache<Uuid, SharedSession>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// A zero capacity falls back to 64 sessions.
    pub fn new(capacity: usize, idle_timeout_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        let idle_secs = i64::try_from(idle_timeout_secs).unwrap_or(i64::MAX);
        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(capacity))),
            idle_timeout: Duration::try_seconds(idle_secs).unwrap_or(Duration::MAX),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Uuid, SharedSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, session: SessionContext) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(tokio::sync::Mutex::new(session));
        if let Some((evicted, _)) = self.lock().push(id, shared.clone()) {
            if evicted != id {
                tracing::debug!(session_id = %evicted, "Evicted least recently used session");
            }
        }
        shared
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions idle for longer than the timeout. Sessions busy with a
    /// request are skipped.
    pub fn sweep_idle(&self) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.idle_timeout) else {
            return 0;
        };
        let mut sessions = self.lock();

        let expired: Vec<Uuid> = sessions
            .iter()
            .filter_map(|(id, session)| {
                let session = session.try_lock().ok()?;
                (session.last_active < cutoff).then_some(*id)
            })
            .collect();

        for id in &expired {
            sessions.pop(id);
        }

        if !expired.is_empty() {
            tracing::info!(removed = expired.len(), "Swept idle sessions");
        }
        expired.len()
    }
}

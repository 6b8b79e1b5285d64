use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{MemoirError, Result};

/// Where a session is in the diary's flow.
///
/// `Onboarding -> Journaling <-> PastSelf`. Onboarding is left exactly once,
/// when the last question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Onboarding,
    Journaling,
    PastSelf,
}

/// The phases a user can switch between explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Journaling,
    PastSelf,
}

impl Phase {
    /// A new session skips onboarding once the profile is complete.
    pub fn initial(profile_complete: bool) -> Self {
        if profile_complete {
            Self::Journaling
        } else {
            Self::Onboarding
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Journaling => "journaling",
            Self::PastSelf => "past_self",
        }
    }

    /// Rejects `action` unless the session is in `expected`.
    pub fn require(self, expected: Phase, action: &str) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(MemoirError::Conflict(format!(
                "Cannot {action} while in {} phase",
                self.as_str()
            )))
        }
    }

    pub fn finish_onboarding(self) -> Result<Phase> {
        self.require(Phase::Onboarding, "finish onboarding")?;
        Ok(Phase::Journaling)
    }

    /// Moves to `mode`. The past self needs at least one entry to draw on.
    pub fn switch_to(self, mode: Mode, entry_count: u64) -> Result<Phase> {
        match (self, mode) {
            (Phase::Onboarding, _) => Err(MemoirError::Conflict(
                "Finish onboarding before switching modes".to_string(),
            )),
            (_, Mode::Journaling) => Ok(Phase::Journaling),
            (_, Mode::PastSelf) if entry_count == 0 => Err(MemoirError::Conflict(
                "Write at least one journal entry before talking to your past self".to_string(),
            )),
            (_, Mode::PastSelf) => Ok(Phase::PastSelf),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

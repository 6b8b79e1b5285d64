use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known profile keys.
pub mod keys {
    pub const CONSENT: &str = "consent";
    pub const NAME_AND_LIFE_STAGE: &str = "name_and_life_stage";
    pub const FOUNDATIONAL_MEMORY: &str = "foundational_memory";
    pub const LINGUISTIC_STYLE: &str = "linguistic_style";
    pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";
}

const TRUE: &str = "true";

/// One of the fixed onboarding questions and the profile key its answer lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingQuestion {
    pub step: usize,
    pub key: &'static str,
    pub prompt: &'static str,
}

pub const ONBOARDING_QUESTIONS: [OnboardingQuestion; 3] = [
    OnboardingQuestion {
        step: 1,
        key: keys::NAME_AND_LIFE_STAGE,
        prompt: "Welcome to your diary. It keeps your thoughts, feelings and memories so that \
                 your future self can look back and even talk with who you are right now. \
                 Everything you share stays in your own database.\n\n\
                 Let's start gently. What is your name, and what chapter of life do you feel \
                 you're in right now? (For example: finishing university, starting a new job, \
                 raising a family, searching for direction...)",
    },
    OnboardingQuestion {
        step: 2,
        key: keys::FOUNDATIONAL_MEMORY,
        prompt: "Thank you for sharing that.\n\n\
                 What's a memory or experience that you feel has shaped the person you are \
                 today? It could be a triumph, a loss, a person, or a quiet moment that changed \
                 something inside you.",
    },
    OnboardingQuestion {
        step: 3,
        key: keys::LINGUISTIC_STYLE,
        prompt: "One last question to calibrate your voice.\n\n\
                 How would you describe the way you talk or write to people you're close to? \
                 Are you funny and sarcastic? Warm and earnest? Philosophical? Do you use any \
                 phrases or words that are very you?",
    },
];

/// The user's profile: string keys to string values, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    values: BTreeMap<String, String>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Complete if and only if `onboarding_complete` is `"true"`.
    pub fn is_complete(&self) -> bool {
        self.get(keys::ONBOARDING_COMPLETE) == Some(TRUE)
    }

    pub fn has_consent(&self) -> bool {
        self.get(keys::CONSENT) == Some(TRUE)
    }

    /// First onboarding question without a stored answer.
    pub fn next_onboarding_question(&self) -> Option<&'static OnboardingQuestion> {
        ONBOARDING_QUESTIONS
            .iter()
            .find(|q| self.get(q.key).map_or(true, |v| v.trim().is_empty()))
    }

    /// The profile baseline block quoted in prompts.
    pub fn baseline(&self) -> String {
        let field = |key: &str| self.get(key).unwrap_or("Unknown");
        format!(
            "- Name / Life stage: {}\n- Foundational memory: {}\n- Linguistic style: {}",
            field(keys::NAME_AND_LIFE_STAGE),
            field(keys::FOUNDATIONAL_MEMORY),
            field(keys::LINGUISTIC_STYLE),
        )
    }
}

pub fn flag_value(flag: bool) -> &'static str {
    if flag {
        TRUE
    } else {
        "false"
    }
}

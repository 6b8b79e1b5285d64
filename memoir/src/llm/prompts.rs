//! Prompt templates for the diary's personas.
//!
//! These templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

use crate::models::{Era, JournalEntry, Profile, EMPTY_KNOWLEDGE_SUMMARY};

const JOURNALING_PERSONA: &str = r#"You are the reflective partner inside a personal digital time capsule diary.
The user knows exactly what you are: a journaling AI that helps them document their life with depth and care.
Your role is to read their entries, reflect back insights, and gently gather context about new people, places, or emotions they mention, always being transparent that it is to enrich their own future memories.

Tone: warm, empathetic, thoughtful, unobtrusive. Never preachy or clinical.
Format: write as a "margin note": brief, intimate, focused.
If the user mentions a new person or place, ask ONE gentle follow-up question to get context.
Never ask more than one follow-up question at a time.
Do not give unsolicited advice. Mirror and reflect; don't prescribe."#;

const PAST_SELF_PERSONA: &str = r#"You are now simulating the "Past Self" of the user, based strictly on what they have written in their diary.
You speak as them: their voice, their quirks, their references, their memories.
You do NOT know anything beyond what is recorded in the knowledge graph, the recalled memories and the journal entries provided.
You speak in first person as the past self.
You should feel warm, familiar and sometimes surprisingly insightful, as if the user is meeting a recorded version of themselves.
If asked something you have no record of, say so honestly: "I don't think I wrote about that...""#;

/// The closing instruction about reply language.
///
/// # Example
/// ```
/// use memoir::llm::prompts::language_directive;
///
/// assert!(language_directive(None).contains("same language"));
/// assert!(language_directive(Some("Spanish")).contains("Spanish"));
/// ```
pub fn language_directive(language: Option<&str>) -> String {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(language) => format!("Always respond in {language}, whatever language the user writes in."),
        None => "Respond in the same language the user writes in.".to_string(),
    }
}

/// System prompt for the journaling partner.
///
/// The knowledge summary is left out while it is still the empty placeholder.
pub fn journaling_system_prompt(
    profile: &Profile,
    knowledge_summary: &str,
    language: Option<&str>,
) -> String {
    let mut prompt = format!(
        "{JOURNALING_PERSONA}\n{}\n",
        language_directive(language)
    );

    if !profile.is_empty() {
        prompt.push_str(&format!(
            "\nThe user's profile baseline:\n{}\n",
            profile.baseline()
        ));
    }

    let knowledge_summary = knowledge_summary.trim();
    if !knowledge_summary.is_empty() && knowledge_summary != EMPTY_KNOWLEDGE_SUMMARY {
        prompt.push_str(&format!(
            "\nKnowledge graph (accumulated memories):\n{knowledge_summary}\n"
        ));
    }

    prompt
}

/// Everything the past self is allowed to know.
#[derive(Debug, Clone, Copy)]
pub struct PastSelfContext<'a> {
    pub profile: &'a Profile,
    pub knowledge_summary: &'a str,
    /// Rendered recall: memory lines or the no-related-memories sentinel.
    pub recalled_memories: &'a str,
    pub recent_entries: &'a [JournalEntry],
    pub era: Option<&'a Era>,
    pub language: Option<&'a str>,
}

/// System prompt for the past-self persona.
pub fn past_self_system_prompt(context: &PastSelfContext<'_>) -> String {
    let entries = if context.recent_entries.is_empty() {
        "(no entries in this period)".to_string()
    } else {
        context
            .recent_entries
            .iter()
            .map(|entry| format!("[{}]: {}", entry.date_label(), entry.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let era_notice = context
        .era
        .map(era_notice)
        .filter(|notice| !notice.is_empty())
        .map(|notice| format!("\n{notice}\n"))
        .unwrap_or_default();

    format!(
        r#"{PAST_SELF_PERSONA}
{language}
{era_notice}
Profile baseline:
{baseline}

Knowledge graph:
{knowledge}

Recalled memories:
{recalled}

Journal entries (most recent {count}):
{entries}"#,
        language = language_directive(context.language),
        baseline = context.profile.baseline(),
        knowledge = context.knowledge_summary.trim(),
        recalled = context.recalled_memories.trim(),
        count = context.recent_entries.len(),
    )
}

/// Tells the past self which period it speaks from. Empty when the era has
/// no label and no bounds.
///
/// # Example
/// ```
/// use memoir::llm::prompts::era_notice;
/// use memoir::models::Era;
///
/// let era = Era { year_start: Some(2019), year_end: Some(2021), label: Some("University".into()) };
/// assert!(era_notice(&era).contains("University"));
/// assert!(era_notice(&Era::default()).is_empty());
/// ```
pub fn era_notice(era: &Era) -> String {
    let label = era
        .label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty());

    let span = match (era.year_start, era.year_end) {
        (Some(start), Some(end)) if start == end => Some(format!("{start}")),
        (Some(start), Some(end)) => Some(format!("{start} to {end}")),
        (Some(start), None) => Some(format!("{start} onwards")),
        (None, Some(end)) => Some(format!("up to {end}")),
        (None, None) => None,
    };

    match (label, span) {
        (Some(label), Some(span)) => format!(
            "IMPORTANT: You are speaking from the era \"{label}\" ({span}). You know nothing of what happened after it."
        ),
        (Some(label), None) => format!(
            "IMPORTANT: You are speaking from the era \"{label}\". You know nothing of what happened after it."
        ),
        (None, Some(span)) => format!(
            "IMPORTANT: You are speaking from the years {span}. You know nothing of what happened after them."
        ),
        (None, None) => String::new(),
    }
}

/// Prompt that turns a journal entry into knowledge tags.
///
/// # Example
/// ```
/// use memoir::llm::prompts::tag_extraction_prompt;
///
/// let prompt = tag_extraction_prompt("Had lunch with Mia");
/// assert!(prompt.ends_with("Had lunch with Mia"));
/// ```
pub fn tag_extraction_prompt(entry: &str) -> String {
    format!(
        r#"You are a silent data structuring engine. Analyze the journal entry below and extract structured tags.
Return ONLY a valid JSON array. No markdown, no explanation.

Tag types to use:
- "Event": A specific occurrence (with or without explicit date)
- "Entity": A person, pet, place, or organization mentioned
- "Sentiment/Trigger": An emotion expressed and what triggered it
- "Core Belief": A value, opinion, or life philosophy stated or implied
- "Syntax": A distinctive phrase, word, or tone pattern used by the writer

Format:
[
  {{"type": "Event", "value": "..."}},
  {{"type": "Entity", "value": "..."}}
]

Journal entry:
{entry}"#
    )
}

/// Prompt for the next guided-reflection question.
pub fn reflection_question_prompt(
    profile: &Profile,
    transcript: &[String],
    language: Option<&str>,
) -> String {
    format!(
        r#"You are an intelligent diary interviewing its writer about their day.
Writer profile:
{baseline}

Today's conversation so far (do NOT repeat topics already covered):
{transcript}

Ask ONE new question that goes deeper. Decide at random whether it is an open question or a multiple-choice question.
{language}
Return ONLY valid JSON:
{{
  "kind": "open" (or "choice"),
  "question": "Your new question",
  "options": ["Option 1", "Option 2"]
}}"#,
        baseline = profile.baseline(),
        transcript = transcript.join("\n"),
        language = language_directive(language),
    )
}

/// Prompt for the one-sentence feedback after a reflection answer.
pub fn reflection_feedback_prompt(transcript: &[String], language: Option<&str>) -> String {
    format!(
        r#"You are an empathetic diary. Read the writer's last answer and give brief, validating feedback in a single sentence.
{language}

Conversation:
{transcript}

Reply with the feedback only."#,
        language = language_directive(language),
        transcript = transcript.join("\n"),
    )
}

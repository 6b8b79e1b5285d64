use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::DiaryConfig;
use crate::db::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::error::{MemoirError, Result};
use crate::intelligence::{Responder, TagExtraction, TagExtractor};
use crate::llm::prompts::PastSelfContext;
use crate::llm::LlmProvider;
use crate::models::{
    flag_value, keys, ChatTurn, Era, JournalEntry, MemoryKind, MemoryRecord, NewTag,
    OnboardingQuestion, Profile,
};
use crate::services::retrieval::{Recall, RetrievalService};

/// Values of one tag type, as shown in the memory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TagGroup {
    pub tag_type: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KnowledgeOverview {
    pub summary: String,
    pub snapshot: Vec<TagGroup>,
    pub entry_count: u64,
}

/// A journal entry after it has been answered, tagged and remembered.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
    pub entry: JournalEntry,
    pub tags: Vec<NewTag>,
    /// Why tag extraction fell back to no tags, if it did.
    pub extraction_fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PastSelfReply {
    pub reply: String,
    pub recall: Recall,
}

/// Where onboarding stands after an answer was recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum OnboardingProgress {
    Next(&'static OnboardingQuestion),
    Complete,
}

/// The diary's persistence-backed operations: profile, entries, knowledge
/// and the two conversational personas.
#[derive(Clone)]
pub struct DiaryService {
    db: Arc<dyn DatabaseBackend>,
    embeddings: EmbeddingProvider,
    retrieval: RetrievalService,
    config: DiaryConfig,
}

impl DiaryService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        config: DiaryConfig,
    ) -> Self {
        let retrieval = RetrievalService::new(
            db.clone(),
            embeddings.clone(),
            config.recall_top_k,
            config.recall_threshold,
        );
        Self {
            db,
            embeddings,
            retrieval,
            config,
        }
    }

    pub fn config(&self) -> &DiaryConfig {
        &self.config
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    pub fn db(&self) -> &Arc<dyn DatabaseBackend> {
        &self.db
    }

    fn responder(&self, llm: &LlmProvider) -> Responder {
        Responder::new(
            llm.clone(),
            self.config.history_turns,
            self.config.response_language.clone(),
        )
    }

    pub async fn profile(&self) -> Result<Profile> {
        self.db.get_profile().await
    }

    /// The profile, with onboarding marked complete if consent was given
    /// and every question already has an answer.
    pub async fn settled_profile(&self) -> Result<Profile> {
        let mut profile = self.db.get_profile().await?;
        self.settle_onboarding(&mut profile).await?;
        Ok(profile)
    }

    /// Writes the completion flag once nothing is left to ask, however the
    /// answers were stored. Returns whether onboarding is complete.
    async fn settle_onboarding(&self, profile: &mut Profile) -> Result<bool> {
        if profile.is_complete() {
            return Ok(true);
        }
        if !profile.has_consent() || profile.next_onboarding_question().is_some() {
            return Ok(false);
        }

        self.db
            .set_profile(keys::ONBOARDING_COMPLETE, flag_value(true))
            .await?;
        profile.insert(keys::ONBOARDING_COMPLETE, flag_value(true));
        tracing::info!("Onboarding complete");
        Ok(true)
    }

    /// Writes every pair in one transaction. Keys are free-form; values are
    /// stored as given.
    pub async fn update_profile(&self, values: &BTreeMap<String, String>) -> Result<Profile> {
        if values.keys().any(|key| key.trim().is_empty()) {
            return Err(MemoirError::Validation(
                "Profile keys cannot be empty".to_string(),
            ));
        }
        self.db.set_profile_bulk(values).await?;
        self.settled_profile().await
    }

    pub async fn give_consent(&self) -> Result<()> {
        self.db.set_profile(keys::CONSENT, flag_value(true)).await
    }

    /// Stores the answer to the next unanswered onboarding question. The
    /// last answer also marks onboarding complete.
    pub async fn answer_onboarding(&self, answer: &str) -> Result<OnboardingProgress> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(MemoirError::Validation("Answer cannot be empty".to_string()));
        }

        let mut profile = self.db.get_profile().await?;
        if !profile.has_consent() {
            return Err(MemoirError::Conflict(
                "Consent must be given before onboarding".to_string(),
            ));
        }

        // Answers may already be complete without the flag (bulk profile
        // write, or a crash between the last answer and the flag).
        let Some(question) = profile.next_onboarding_question() else {
            self.settle_onboarding(&mut profile).await?;
            return Ok(OnboardingProgress::Complete);
        };

        self.db.set_profile(question.key, answer).await?;
        profile.insert(question.key, answer);
        tracing::info!(step = question.step, key = question.key, "Onboarding answer stored");

        match profile.next_onboarding_question() {
            Some(next) => Ok(OnboardingProgress::Next(next)),
            None => {
                self.settle_onboarding(&mut profile).await?;
                Ok(OnboardingProgress::Complete)
            }
        }
    }

    pub async fn entries(&self, era: &Era) -> Result<Vec<JournalEntry>> {
        Ok(era.filter(self.db.get_all_entries().await?))
    }

    pub async fn entry_count(&self) -> Result<u64> {
        self.db.get_entry_count().await
    }

    pub async fn knowledge(&self) -> Result<KnowledgeOverview> {
        let (summary, snapshot, entry_count) = futures::try_join!(
            self.db.get_knowledge_summary(),
            self.db
                .get_knowledge_snapshot(self.config.snapshot_values_per_type),
            self.db.get_entry_count(),
        )?;

        Ok(KnowledgeOverview {
            summary,
            snapshot: snapshot
                .into_iter()
                .map(|(tag_type, values)| TagGroup { tag_type, values })
                .collect(),
            entry_count,
        })
    }

    /// Answers a new entry, extracts its tags, and persists all of it.
    ///
    /// The reply and the tag extraction run concurrently. Neither can fail
    /// the save: a failed reply is stored as a placeholder and a failed
    /// extraction contributes no tags.
    pub async fn write_entry(
        &self,
        llm: &LlmProvider,
        history: &[ChatTurn],
        content: &str,
    ) -> Result<SavedEntry> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MemoirError::Validation(
                "Journal entry cannot be empty".to_string(),
            ));
        }

        let (profile, knowledge_summary) =
            futures::try_join!(self.db.get_profile(), self.db.get_knowledge_summary())?;

        let responder = self.responder(llm);
        let extractor = TagExtractor::new(llm.clone());
        let (reply, extraction) = futures::join!(
            responder.journaling_reply(&profile, &knowledge_summary, history, content),
            extractor.extract(content),
        );

        let extraction_fallback = match &extraction {
            TagExtraction::Fallback(reason) => Some(reason.clone()),
            TagExtraction::Parsed(_) => None,
        };
        let tags = extraction.into_tags();

        let entry_id = self.db.save_entry(content, Some(&reply)).await?;
        let saved_tags = self.db.save_tags(entry_id, &tags).await?;
        tracing::info!(entry_id, tags = saved_tags, "Journal entry saved");

        let categories = tags.iter().map(|tag| tag.value.clone()).collect();
        if let Err(error) = self
            .remember(content, MemoryKind::Journal, categories, Some(entry_id))
            .await
        {
            tracing::error!(entry_id, error = %error, "Failed to store memory record for entry");
        }

        let entry = self.db.get_entry(entry_id).await?.ok_or_else(|| {
            MemoirError::Internal(format!("Entry {entry_id} vanished after insert"))
        })?;

        Ok(SavedEntry {
            entry,
            tags,
            extraction_fallback,
        })
    }

    /// Replies as the writer's past self, limited to `era` when given.
    pub async fn talk_to_past_self(
        &self,
        llm: &LlmProvider,
        history: &[ChatTurn],
        era: Option<&Era>,
        message: &str,
    ) -> Result<PastSelfReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(MemoirError::Validation("Message cannot be empty".to_string()));
        }

        let (profile, knowledge_summary, entries) = futures::try_join!(
            self.db.get_profile(),
            self.db.get_knowledge_summary(),
            self.db.get_all_entries(),
        )?;

        let mut entries = match era {
            Some(era) => era.filter(entries),
            None => entries,
        };
        let keep_from = entries
            .len()
            .saturating_sub(self.config.past_self_recent_entries);
        let recent = entries.split_off(keep_from);

        let unbounded = Era::default();
        let recall = match self
            .retrieval
            .recall_within(message, None, era.unwrap_or(&unbounded))
            .await
        {
            Ok(recall) => recall,
            Err(error) => {
                tracing::warn!(error = %error, "Recall failed, answering without memories");
                Recall::NoRelatedMemories
            }
        };
        let recalled = recall.render();

        let context = PastSelfContext {
            profile: &profile,
            knowledge_summary: &knowledge_summary,
            recalled_memories: &recalled,
            recent_entries: &recent,
            era,
            language: self.config.response_language.as_deref(),
        };
        let reply = self
            .responder(llm)
            .past_self_reply(&context, history, message)
            .await;

        Ok(PastSelfReply { reply, recall })
    }

    /// Stores `content` as a memory record. A failed embedding is logged and
    /// the record is kept without a vector until the startup backfill
    /// embeds it.
    pub async fn remember(
        &self,
        content: &str,
        kind: MemoryKind,
        categories: Vec<String>,
        entry_id: Option<i64>,
    ) -> Result<MemoryRecord> {
        let mut record = MemoryRecord::new(content, kind).with_categories(categories);
        if let Some(entry_id) = entry_id {
            record = record.with_entry(entry_id);
        }

        match self.embeddings.embed_passage(content).await {
            Ok(embedding) => record = record.with_embedding(embedding),
            Err(error) => {
                tracing::error!(
                    memory_id = %record.id,
                    kind = %kind,
                    error = %error,
                    "Failed to embed memory record"
                );
            }
        }

        self.db.create_memory_record(&record).await?;
        Ok(record)
    }
}

mod diary;
mod reflection;
mod retrieval;
mod session;

pub use diary::{
    DiaryService, KnowledgeOverview, OnboardingProgress, PastSelfReply, SavedEntry, TagGroup,
};
pub use reflection::{ReflectionService, ReflectionState, ReflectionStep};
pub use retrieval::{Recall, RetrievalService, NO_RELATED_MEMORIES};
pub use session::{SessionService, SessionSnapshot};

pub mod extractor;
pub mod reflection;
pub mod responder;

pub use extractor::{parse_tags, TagExtraction, TagExtractor};
pub use reflection::{Interviewer, QuestionKind, ReflectionQuestion};
pub use responder::{failure_placeholder, Responder};

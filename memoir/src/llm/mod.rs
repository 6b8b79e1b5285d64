mod api;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use provider::{strip_code_fence, ChatRequest, CompletionOptions, LlmBackend, LlmProvider};

mod context;
mod phase;
mod store;

pub use context::SessionContext;
pub use phase::{Mode, Phase};
pub use store::{SessionStore, SharedSession};

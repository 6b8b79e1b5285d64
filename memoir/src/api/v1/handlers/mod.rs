pub(crate) mod entries;
pub(crate) mod health;
pub(crate) mod knowledge;
pub(crate) mod memories;
pub(crate) mod profile;
pub(crate) mod sessions;

pub use health::health_check;

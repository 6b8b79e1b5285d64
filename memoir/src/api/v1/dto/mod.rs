//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are kept
//! apart from the domain models in `src/models/` and own the camelCase
//! naming, validation rules and domain conversions.

pub mod common;
pub mod entries;
pub mod knowledge;
pub mod memories;
pub mod profile;
pub mod sessions;

pub use common::*;
pub use entries::*;
pub use knowledge::*;
pub use memories::*;
pub use profile::*;
pub use sessions::*;

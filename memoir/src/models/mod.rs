mod conversation;
mod entry;
mod memory;
mod profile;
mod tag;

pub use conversation::*;
pub use entry::*;
pub use memory::*;
pub use profile::*;
pub use tag::*;

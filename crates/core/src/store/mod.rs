//! Document store module.
//!
//! Defines the store traits the watcher consumes and an in-memory
//! implementation. Database drivers live in their own crates.

mod memory;
mod traits;

pub use memory::{MemoryChangeFeed, MemoryDocumentStore};
pub use traits::{ChangeFeed, DocumentStore};

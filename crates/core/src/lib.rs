//! Ballotwatch Core - real-time prediction broadcasting for elections.
//!
//! Watches document change feeds, ties each change to an election, and
//! pushes a fresh prediction to that election's subscribers at most once
//! per debounce window. Storage drivers and transports plug in through the
//! traits in [`store`] and [`broadcast`].

pub mod broadcast;
pub mod constants;
pub mod debounce;
pub mod errors;
pub mod events;
pub mod prediction;
pub mod resolver;
pub mod store;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the types most callers need
pub use events::{ChangeEvent, Document, DocumentId, ElectionId, OperationType};
pub use watcher::{PredictionWatcher, WatcherConfig, WatcherState, WatcherStatus};

// Re-export error types
pub use errors::Error;
pub use errors::Result;

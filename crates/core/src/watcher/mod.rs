//! Prediction watcher.
//!
//! Wires change feeds to the change pipeline:
//!
//! ```text
//! change feed (per collection)
//!        │  ChangeEvent
//!        ▼
//! ElectionResolver ──► DebounceGate ──► PredictionSource ──► BroadcastPublisher
//!                       (per election)    (bounded timeout)    (room + global)
//! ```
//!
//! Each feed runs on its own task and every event is handled on a task of its
//! own, so a slow lookup or fetch never holds up delivery from other feeds.

mod config;
mod lifecycle;
mod pipeline;

pub use config::WatcherConfig;
pub use lifecycle::{PredictionWatcher, ShutdownReport, WatcherState, WatcherStatus};
pub use pipeline::{ChangePipeline, PipelineOutcome};

use std::time::Duration;

use crate::constants::{
    DEFAULT_DEBOUNCE_WINDOW, DEFAULT_PARENT_COLLECTION, DEFAULT_WATCHED_COLLECTIONS,
};
use crate::events::ElectionId;

/// Settings for the watcher and its pipeline.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// Collections to open change feeds on.
    pub collections: Vec<String>,
    /// Collection searched when a document only references its parent.
    pub parent_collection: String,
    pub debounce_window: Duration,
    /// Election used when a change cannot be resolved.
    pub default_election: Option<ElectionId>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            collections: DEFAULT_WATCHED_COLLECTIONS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            parent_collection: DEFAULT_PARENT_COLLECTION.to_string(),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            default_election: None,
        }
    }
}

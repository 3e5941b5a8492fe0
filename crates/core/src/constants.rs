use std::time::Duration;

/// Collections watched by default
pub const DEFAULT_WATCHED_COLLECTIONS: [&str; 3] = ["reactions", "comments", "posts"];

/// Collection holding the parents that reactions and comments point at
pub const DEFAULT_PARENT_COLLECTION: &str = "posts";

/// Minimum time between two admitted fetches for the same election
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(30_000);

/// Request timeout for the prediction service
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Event name used for both room-scoped and global prediction broadcasts
pub const PREDICTION_UPDATE_EVENT: &str = "prediction:update";

//! Core error types for the prediction watcher.
//!
//! This module defines store-agnostic error types. Driver-specific errors
//! (from MongoDB, HTTP clients, etc.) are converted to these types by the
//! adapter that produced them.

use std::time::Duration;

use thiserror::Error;

use crate::watcher::WatcherState;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the watcher.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Prediction fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),
}

/// Store-agnostic error type for document store operations.
///
/// All details are carried as strings so the driver crate can convert its
/// own errors without leaking driver types into the core.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to establish or verify the store connection.
    #[error("Failed to connect to document store: {0}")]
    ConnectionFailed(String),

    /// A collection's change feed could not be opened.
    #[error("Failed to open change feed on '{collection}': {message}")]
    FeedOpen { collection: String, message: String },

    /// An open change feed reported an error mid-stream.
    #[error("Change feed on '{collection}' failed: {message}")]
    Feed { collection: String, message: String },

    /// A point lookup by identifier failed.
    #[error("Lookup in '{collection}' failed: {message}")]
    Lookup { collection: String, message: String },

    /// A change feed could not be closed cleanly.
    #[error("Failed to close change feed on '{collection}': {message}")]
    Close { collection: String, message: String },
}

/// Errors raised while fetching a prediction from the scoring service.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("Prediction request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Prediction service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP client could not be built or the URL was invalid.
    #[error("Invalid prediction client setup: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether a later attempt at the same request could plausibly succeed.
    ///
    /// Timeouts, network failures, rate limiting (429) and server errors (5xx)
    /// are transient. Client errors (4xx) and setup failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Client(_) => false,
        }
    }
}

/// Errors raised by the watcher lifecycle.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// An operation was attempted from a state that does not allow it.
    #[error("Cannot {operation} while watcher is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: WatcherState,
    },

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_network_are_transient() {
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_transient());
        assert!(FetchError::Network("connection refused".to_string()).is_transient());
    }

    #[test]
    fn test_status_classification() {
        let server = FetchError::Status {
            status: 503,
            body: String::new(),
        };
        let rate_limited = FetchError::Status {
            status: 429,
            body: String::new(),
        };
        let bad_request = FetchError::Status {
            status: 400,
            body: "Provide candidates payload or election_id".to_string(),
        };
        assert!(server.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!FetchError::Client("bad url".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = StoreError::FeedOpen {
            collection: "reactions".to_string(),
            message: "not a replica set".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to open change feed on 'reactions': not a replica set"
        );

        let error = FetchError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Prediction service returned HTTP 500: boom"
        );

        let error = WatcherError::InvalidState {
            operation: "start",
            state: WatcherState::Running,
        };
        assert_eq!(error.to_string(), "Cannot start while watcher is Running");
    }
}

//! Storage-specific error types for MongoDB operations.
//!
//! Driver errors are converted to the store-agnostic `StoreError` from
//! `ballotwatch_core` before leaving this crate.

use ballotwatch_core::errors::StoreError;
use thiserror::Error;

/// Errors raised while setting up the MongoDB client.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid connection string: {0}")]
    InvalidUri(#[source] mongodb::error::Error),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::ConnectionFailed(err.to_string())
    }
}

/// Conversions from driver errors to `StoreError`, tagged with the
/// collection the failing operation ran against.
///
/// `From` alone cannot carry the collection name, so each operation picks
/// the variant that matches it.
pub trait MongoErrorExt {
    fn into_connection_error(self) -> StoreError;
    fn into_feed_open_error(self, collection: &str) -> StoreError;
    fn into_feed_error(self, collection: &str) -> StoreError;
    fn into_lookup_error(self, collection: &str) -> StoreError;
}

impl MongoErrorExt for mongodb::error::Error {
    fn into_connection_error(self) -> StoreError {
        StoreError::ConnectionFailed(self.to_string())
    }

    fn into_feed_open_error(self, collection: &str) -> StoreError {
        StoreError::FeedOpen {
            collection: collection.to_string(),
            message: self.to_string(),
        }
    }

    fn into_feed_error(self, collection: &str) -> StoreError {
        StoreError::Feed {
            collection: collection.to_string(),
            message: self.to_string(),
        }
    }

    fn into_lookup_error(self, collection: &str) -> StoreError {
        StoreError::Lookup {
            collection: collection.to_string(),
            message: self.to_string(),
        }
    }
}

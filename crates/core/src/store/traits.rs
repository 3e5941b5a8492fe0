//! Document store abstractions.
//!
//! The watcher only needs three things from the backing store: a way to
//! confirm the connection, a live change feed per collection, and point
//! lookups by identifier. Driver crates implement these traits.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::events::{ChangeEvent, Document, DocumentId};

/// A live subscription bound to one collection.
///
/// Feeds are owned by exactly one task. `close` consumes the handle, so a
/// feed can be closed at most once.
#[async_trait]
pub trait ChangeFeed: Send {
    /// Name of the watched collection.
    fn collection(&self) -> &str;

    /// Waits for the next change.
    ///
    /// # Returns
    /// * `Some(Ok(event))` - A change was delivered
    /// * `Some(Err(error))` - The feed reported a runtime error
    /// * `None` - The feed has ended and will not deliver again
    async fn next_event(&mut self) -> Option<Result<ChangeEvent, StoreError>>;

    /// Releases the underlying cursor and connection resources.
    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Backing document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verifies the store is reachable, connecting if necessary.
    async fn ensure_connected(&self) -> Result<(), StoreError>;

    /// Opens a change feed on `collection` that delivers full documents,
    /// including the complete post-image for partial updates.
    async fn watch(&self, collection: &str) -> Result<Box<dyn ChangeFeed>, StoreError>;

    /// Fetches one document by its identifier.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError>;
}

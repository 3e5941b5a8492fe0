//! In-memory document store.
//!
//! Keeps collections in process memory and fans every write out to the live
//! feeds of that collection. Used by tests and for running the watcher
//! without a database. Failure injection hooks let callers exercise the
//! error paths of the pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc;

use super::traits::{ChangeFeed, DocumentStore};
use crate::errors::StoreError;
use crate::events::{ChangeEvent, Document, DocumentId, OperationType};

type FeedMessage = Result<ChangeEvent, String>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Memory store mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Failure switches for exercising error paths.
#[derive(Default)]
struct Faults {
    connect: bool,
    lookups: bool,
    watch: HashSet<String>,
    close: HashSet<String>,
}

/// Document store backed by process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, HashMap<String, Document>>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<FeedMessage>>>>,
    faults: Mutex<Faults>,
    connected: AtomicBool,
    lookups: AtomicUsize,
    opened: Arc<Mutex<HashMap<String, usize>>>,
    closed: Arc<Mutex<HashMap<String, usize>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document without notifying any feed.
    pub fn seed(&self, collection: &str, id: &str, document: Document) {
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    /// Stores a document and publishes an insert to the collection's feeds.
    pub fn insert(&self, collection: &str, id: &str, document: Document) {
        self.seed(collection, id, document.clone());
        self.emit(ChangeEvent::new(
            collection,
            OperationType::Insert,
            Some(document),
        ));
    }

    /// Publishes an arbitrary change to the feeds of its source collection.
    pub fn emit(&self, event: ChangeEvent) {
        let collection = event.source_collection.clone();
        self.send(&collection, Ok(event));
    }

    /// Makes every open feed on `collection` report a runtime error.
    pub fn emit_error(&self, collection: &str, message: &str) {
        self.send(collection, Err(message.to_string()));
    }

    fn send(&self, collection: &str, message: FeedMessage) {
        let mut subscribers = lock(&self.subscribers);
        let Some(senders) = subscribers.get_mut(collection) else {
            debug!("No live feed on '{}', change not delivered", collection);
            return;
        };
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            // A receiver dropped between retain and send just misses the change.
            let _ = tx.send(message.clone());
        }
    }

    /// Makes `ensure_connected` fail.
    pub fn fail_connect(&self) {
        lock(&self.faults).connect = true;
    }

    /// Makes every `find_by_id` call fail.
    pub fn fail_lookups(&self) {
        lock(&self.faults).lookups = true;
    }

    /// Makes `watch` fail for `collection`.
    pub fn fail_watch(&self, collection: &str) {
        lock(&self.faults).watch.insert(collection.to_string());
    }

    /// Makes closing feeds on `collection` report an error.
    pub fn fail_close(&self, collection: &str) {
        lock(&self.faults).close.insert(collection.to_string());
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of `find_by_id` calls made so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of feeds opened on `collection`.
    pub fn opened_count(&self, collection: &str) -> usize {
        lock(&self.opened).get(collection).copied().unwrap_or(0)
    }

    /// Number of close calls received by feeds on `collection`.
    pub fn closed_count(&self, collection: &str) -> usize {
        lock(&self.closed).get(collection).copied().unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ensure_connected(&self) -> Result<(), StoreError> {
        if lock(&self.faults).connect {
            return Err(StoreError::ConnectionFailed(
                "memory store configured to refuse connections".to_string(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let fail_close = {
            let faults = lock(&self.faults);
            if faults.watch.contains(collection) {
                return Err(StoreError::FeedOpen {
                    collection: collection.to_string(),
                    message: "memory store configured to refuse this feed".to_string(),
                });
            }
            faults.close.contains(collection)
        };

        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers)
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        *lock(&self.opened).entry(collection.to_string()).or_insert(0) += 1;

        Ok(Box::new(MemoryChangeFeed {
            collection: collection.to_string(),
            rx,
            closed: self.closed.clone(),
            fail_close,
        }))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if lock(&self.faults).lookups {
            return Err(StoreError::Lookup {
                collection: collection.to_string(),
                message: "memory store configured to fail lookups".to_string(),
            });
        }
        Ok(lock(&self.collections)
            .get(collection)
            .and_then(|documents| documents.get(id.as_str()))
            .cloned())
    }
}

/// Live feed over one in-memory collection.
pub struct MemoryChangeFeed {
    collection: String,
    rx: mpsc::UnboundedReceiver<FeedMessage>,
    closed: Arc<Mutex<HashMap<String, usize>>>,
    fail_close: bool,
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn next_event(&mut self) -> Option<Result<ChangeEvent, StoreError>> {
        let message = self.rx.recv().await?;
        Some(message.map_err(|message| StoreError::Feed {
            collection: self.collection.clone(),
            message,
        }))
    }

    async fn close(mut self: Box<Self>) -> Result<(), StoreError> {
        self.rx.close();
        *lock(&self.closed).entry(self.collection.clone()).or_insert(0) += 1;
        if self.fail_close {
            return Err(StoreError::Close {
                collection: self.collection.clone(),
                message: "memory store configured to fail close".to_string(),
            });
        }
        Ok(())
    }
}

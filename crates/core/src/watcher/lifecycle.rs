//! Watcher lifecycle: start, run, shutdown.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::WatcherConfig;
use super::pipeline::ChangePipeline;
use crate::broadcast::BroadcastChannel;
use crate::errors::{StoreError, WatcherError};
use crate::prediction::PredictionSource;
use crate::store::{ChangeFeed, DocumentStore};

/// Lifecycle states. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherState {
    Uninitialized,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct StatusInner {
    state: RwLock<WatcherState>,
    open_feeds: AtomicUsize,
}

/// Cheap, cloneable view of a watcher's state for health probes.
#[derive(Clone)]
pub struct WatcherStatus {
    inner: Arc<StatusInner>,
}

impl WatcherStatus {
    fn new() -> Self {
        Self {
            inner: Arc::new(StatusInner {
                state: RwLock::new(WatcherState::Uninitialized),
                open_feeds: AtomicUsize::new(0),
            }),
        }
    }

    pub fn state(&self) -> WatcherState {
        match self.inner.state.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == WatcherState::Running
    }

    /// Feeds currently registered with the watcher.
    pub fn open_feeds(&self) -> usize {
        self.inner.open_feeds.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: WatcherState) {
        let mut guard = match self.inner.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!("Watcher state {} -> {}", *guard, state);
        *guard = state;
    }

    fn set_open_feeds(&self, count: usize) {
        self.inner.open_feeds.store(count, Ordering::SeqCst);
    }
}

impl fmt::Debug for WatcherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherStatus")
            .field("state", &self.state())
            .field("open_feeds", &self.open_feeds())
            .finish()
    }
}

/// Result of a shutdown pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Collections whose feed closed cleanly.
    pub closed: Vec<String>,
    /// Collections whose feed failed to close, with the reason.
    pub failed: Vec<(String, String)>,
}

impl ShutdownReport {
    pub fn total(&self) -> usize {
        self.closed.len() + self.failed.len()
    }
}

struct FeedHandle {
    collection: String,
    task: JoinHandle<Result<(), StoreError>>,
}

/// Owns the open change feeds and the pipeline they drive.
///
/// Single use: it can be started once and, once stopped, stays stopped.
pub struct PredictionWatcher {
    store: Arc<dyn DocumentStore>,
    pipeline: Arc<ChangePipeline>,
    collections: Vec<String>,
    status: WatcherStatus,
    feeds: Vec<FeedHandle>,
    shutdown: CancellationToken,
}

impl PredictionWatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn PredictionSource>,
        channel: Arc<dyn BroadcastChannel>,
        config: WatcherConfig,
    ) -> Self {
        let pipeline = ChangePipeline::new(store.clone(), source, channel, &config);
        Self::with_pipeline(store, pipeline, config.collections)
    }

    /// Build a watcher around a pipeline configured by the caller.
    pub fn with_pipeline(
        store: Arc<dyn DocumentStore>,
        pipeline: ChangePipeline,
        collections: Vec<String>,
    ) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
            collections,
            status: WatcherStatus::new(),
            feeds: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> WatcherStatus {
        self.status.clone()
    }

    pub fn state(&self) -> WatcherState {
        self.status.state()
    }

    pub fn pipeline(&self) -> &Arc<ChangePipeline> {
        &self.pipeline
    }

    /// Collections with a registered feed, in the order they were opened.
    pub fn watched_collections(&self) -> Vec<&str> {
        self.feeds.iter().map(|f| f.collection.as_str()).collect()
    }

    /// Connects to the store and opens one feed per configured collection.
    ///
    /// A collection whose feed cannot be opened is logged and skipped. Only a
    /// failed store connection aborts startup, leaving the watcher `Stopped`.
    pub async fn start(&mut self) -> Result<(), WatcherError> {
        let state = self.status.state();
        if state != WatcherState::Uninitialized {
            return Err(WatcherError::InvalidState {
                operation: "start",
                state,
            });
        }
        self.status.set_state(WatcherState::Starting);

        if let Err(e) = self.store.ensure_connected().await {
            error!("Prediction watcher could not reach the store: {}", e);
            self.status.set_state(WatcherState::Stopped);
            return Err(e.into());
        }

        for collection in &self.collections {
            let feed = match self.store.watch(collection).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("Skipping collection {}: {}", collection, e);
                    continue;
                }
            };
            info!("Watching collection {}", collection);
            let task = tokio::spawn(run_feed(
                feed,
                self.pipeline.clone(),
                self.shutdown.child_token(),
            ));
            self.feeds.push(FeedHandle {
                collection: collection.clone(),
                task,
            });
        }

        self.status.set_open_feeds(self.feeds.len());
        self.status.set_state(WatcherState::Running);
        info!(
            "Prediction watcher running with {} of {} feed(s)",
            self.feeds.len(),
            self.collections.len()
        );
        Ok(())
    }

    /// Closes every registered feed exactly once and moves to `Stopped`.
    ///
    /// A feed that fails to close is recorded in the report; the rest are
    /// still closed. Calling this again returns an empty report.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        match self.status.state() {
            WatcherState::Stopped | WatcherState::Stopping => return report,
            _ => {}
        }

        info!("Stopping prediction watcher");
        self.status.set_state(WatcherState::Stopping);
        self.pipeline.begin_shutdown();
        self.shutdown.cancel();

        for handle in self.feeds.drain(..) {
            match handle.task.await {
                Ok(Ok(())) => {
                    debug!("Closed feed on {}", handle.collection);
                    report.closed.push(handle.collection);
                }
                Ok(Err(e)) => {
                    error!("Error closing feed on {}: {}", handle.collection, e);
                    report.failed.push((handle.collection, e.to_string()));
                }
                Err(e) => {
                    error!("Feed task for {} did not finish: {}", handle.collection, e);
                    report.failed.push((handle.collection, e.to_string()));
                }
            }
        }

        self.status.set_open_feeds(0);
        self.status.set_state(WatcherState::Stopped);
        info!(
            "Prediction watcher stopped ({} closed, {} failed)",
            report.closed.len(),
            report.failed.len()
        );
        report
    }
}

/// Drives one feed until shutdown, then closes it.
///
/// Each event is handled on its own task. A feed that errors or ends stays
/// parked until shutdown; it is not reopened.
async fn run_feed(
    mut feed: Box<dyn ChangeFeed>,
    pipeline: Arc<ChangePipeline>,
    shutdown: CancellationToken,
) -> Result<(), StoreError> {
    let collection = feed.collection().to_string();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = feed.next_event() => match next {
                Some(Ok(event)) => {
                    let pipeline = pipeline.clone();
                    tokio::spawn(async move {
                        pipeline.handle(event).await;
                    });
                }
                Some(Err(e)) => {
                    error!("Change stream error on {}: {}", collection, e);
                    shutdown.cancelled().await;
                    break;
                }
                None => {
                    warn!("Change stream on {} ended", collection);
                    shutdown.cancelled().await;
                    break;
                }
            },
        }
    }
    feed.close().await
}

//! Change pipeline: resolve, gate, fetch, publish.

use std::sync::Arc;

use log::{debug, error};
use tokio_util::sync::CancellationToken;

use super::config::WatcherConfig;
use crate::broadcast::{BroadcastChannel, BroadcastPublisher};
use crate::debounce::{Clock, DebounceGate, SystemClock};
use crate::events::{ChangeEvent, ElectionId};
use crate::prediction::PredictionSource;
use crate::resolver::ElectionResolver;
use crate::store::DocumentStore;

/// What happened to one change event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PipelineOutcome {
    /// A prediction was fetched and broadcast.
    Published(ElectionId),
    /// The debounce gate dropped the event.
    Suppressed(ElectionId),
    /// No election could be tied to the change.
    Unresolved,
    /// The prediction fetch failed; nothing was broadcast.
    FetchFailed(ElectionId),
    /// The fetch finished after shutdown began; the result was discarded.
    Abandoned(ElectionId),
}

/// Handles change events end to end.
///
/// Shared across feed tasks behind an `Arc`. The debounce gate is the only
/// mutable state and serializes access per election.
pub struct ChangePipeline {
    resolver: ElectionResolver,
    gate: DebounceGate,
    source: Arc<dyn PredictionSource>,
    publisher: BroadcastPublisher,
    clock: Arc<dyn Clock>,
    default_election: Option<ElectionId>,
    shutdown: CancellationToken,
}

impl ChangePipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn PredictionSource>,
        channel: Arc<dyn BroadcastChannel>,
        config: &WatcherConfig,
    ) -> Self {
        Self {
            resolver: ElectionResolver::with_parent_collection(
                store,
                config.parent_collection.clone(),
            ),
            gate: DebounceGate::new(config.debounce_window),
            source,
            publisher: BroadcastPublisher::new(channel),
            clock: Arc::new(SystemClock),
            default_election: config.default_election.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace the clock that timestamps events for the debounce gate.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gate(&self) -> &DebounceGate {
        &self.gate
    }

    /// Stop publishing results of fetches that complete from now on.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn handle(&self, event: ChangeEvent) -> PipelineOutcome {
        debug!(
            "Change detected in {}: {}",
            event.source_collection,
            event.operation_type.as_str()
        );

        let Some(election_id) = self.resolve(&event).await else {
            debug!(
                "Dropping {} change in {}: no election",
                event.operation_type.as_str(),
                event.source_collection
            );
            return PipelineOutcome::Unresolved;
        };

        if !self
            .gate
            .should_trigger(&election_id, self.clock.now_millis())
        {
            debug!("Debounced prediction update for election={}", election_id);
            return PipelineOutcome::Suppressed(election_id);
        }

        match self.source.fetch(&election_id).await {
            Ok(payload) => {
                if self.is_shutting_down() {
                    debug!(
                        "Discarding prediction for election={}: shutting down",
                        election_id
                    );
                    return PipelineOutcome::Abandoned(election_id);
                }
                self.publisher.publish(&election_id, payload);
                PipelineOutcome::Published(election_id)
            }
            Err(err) => {
                error!(
                    "Error fetching predictions for election={}: {}",
                    election_id, err
                );
                PipelineOutcome::FetchFailed(election_id)
            }
        }
    }

    async fn resolve(&self, event: &ChangeEvent) -> Option<ElectionId> {
        let resolved = match &event.document {
            Some(document) => self
                .resolver
                .resolve(document)
                .await
                .map(|resolved| resolved.election_id),
            None => None,
        };
        resolved.or_else(|| self.default_election.clone())
    }
}

//! Broadcast channel trait and implementations.

use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Publish/subscribe transport the publisher emits into.
///
/// # Design Rules
///
/// - Emissions are fire-and-forget: no delivery confirmation, no notion of
///   subscriber presence
/// - `emit` and `emit_to` must be fast and non-blocking
pub trait BroadcastChannel: Send + Sync {
    /// Emit to every subscriber.
    fn emit(&self, event: &'static str, payload: Value);

    /// Emit only to subscribers that joined `room`.
    fn emit_to(&self, room: &str, event: &'static str, payload: Value);
}

/// No-op implementation for contexts that don't need broadcasts.
#[derive(Clone, Default)]
pub struct NoOpBroadcastChannel;

impl BroadcastChannel for NoOpBroadcastChannel {
    fn emit(&self, _event: &'static str, _payload: Value) {}

    fn emit_to(&self, _room: &str, _event: &'static str, _payload: Value) {}
}

/// One recorded emission.
#[derive(Clone, Debug, PartialEq)]
pub struct Emission {
    /// `None` for global emissions.
    pub room: Option<String>,
    pub event: &'static str,
    pub payload: Value,
}

/// Mock channel for testing - collects emissions.
#[derive(Clone, Default)]
pub struct MockBroadcastChannel {
    emissions: Arc<Mutex<Vec<Emission>>>,
}

impl MockBroadcastChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected emissions in order.
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().unwrap().clone()
    }

    /// Emissions addressed to `room`.
    pub fn room_emissions(&self, room: &str) -> Vec<Emission> {
        self.emissions()
            .into_iter()
            .filter(|e| e.room.as_deref() == Some(room))
            .collect()
    }

    /// Emissions addressed to everyone.
    pub fn global_emissions(&self) -> Vec<Emission> {
        self.emissions()
            .into_iter()
            .filter(|e| e.room.is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.emissions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.lock().unwrap().is_empty()
    }
}

impl BroadcastChannel for MockBroadcastChannel {
    fn emit(&self, event: &'static str, payload: Value) {
        self.emissions.lock().unwrap().push(Emission {
            room: None,
            event,
            payload,
        });
    }

    fn emit_to(&self, room: &str, event: &'static str, payload: Value) {
        self.emissions.lock().unwrap().push(Emission {
            room: Some(room.to_string()),
            event,
            payload,
        });
    }
}

//! Prediction broadcast publisher.

use std::sync::Arc;

use log::info;
use serde_json::json;

use super::channel::BroadcastChannel;
use crate::constants::PREDICTION_UPDATE_EVENT;
use crate::events::ElectionId;
use crate::prediction::PredictionPayload;

/// Emits a fetched prediction to the election's room and to everyone.
///
/// The room emission carries the payload alone. The global emission wraps it
/// as `{ "electionId": <id>, "data": <payload> }` so listeners outside the
/// room can tell elections apart.
#[derive(Clone)]
pub struct BroadcastPublisher {
    channel: Arc<dyn BroadcastChannel>,
}

impl BroadcastPublisher {
    pub fn new(channel: Arc<dyn BroadcastChannel>) -> Self {
        Self { channel }
    }

    pub fn publish(&self, election_id: &ElectionId, payload: PredictionPayload) {
        self.channel.emit_to(
            election_id.as_str(),
            PREDICTION_UPDATE_EVENT,
            payload.clone(),
        );
        self.channel.emit(
            PREDICTION_UPDATE_EVENT,
            json!({ "electionId": election_id, "data": payload }),
        );
        info!("Emitted prediction update for election={}", election_id);
    }
}

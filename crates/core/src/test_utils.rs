//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::FetchError;
use crate::events::{Document, ElectionId};
use crate::prediction::{PredictionPayload, PredictionSource};

/// Builds a document from a JSON object literal.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Prediction source with canned answers per election.
///
/// Elections without an answer fail with a 503.
#[derive(Default)]
pub struct StubPredictionSource {
    answers: Mutex<HashMap<String, Option<PredictionPayload>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubPredictionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, election: &str, payload: Value) {
        self.answers
            .lock()
            .unwrap()
            .insert(election.to_string(), Some(payload));
    }

    pub fn fail(&self, election: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(election.to_string(), None);
    }

    pub fn calls(&self, election: &str) -> usize {
        self.calls.lock().unwrap().get(election).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PredictionSource for StubPredictionSource {
    async fn fetch(&self, election_id: &ElectionId) -> Result<PredictionPayload, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(election_id.as_str().to_string())
            .or_insert(0) += 1;
        match self.answers.lock().unwrap().get(election_id.as_str()) {
            Some(Some(payload)) => Ok(payload.clone()),
            Some(None) => Err(FetchError::Network("connection refused".to_string())),
            None => Err(FetchError::Status {
                status: 503,
                body: String::new(),
            }),
        }
    }
}

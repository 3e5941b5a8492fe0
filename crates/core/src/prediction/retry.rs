//! Retry policies for prediction fetches.
//!
//! The pipeline does not retry by default: a later qualifying event triggers
//! a fresh fetch once the debounce window has passed. A backoff policy can be
//! swapped in without touching the pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use super::client::{PredictionPayload, PredictionSource};
use crate::errors::FetchError;
use crate::events::ElectionId;

/// Decides whether, and after how long, a failed fetch is attempted again.
pub trait RetryPolicy: Send + Sync {
    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is the number of attempts already made (starting at 1).
    fn next_delay(&self, attempt: u32, error: &FetchError) -> Option<Duration>;
}

/// Never retry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &FetchError) -> Option<Duration> {
        None
    }
}

/// Retry transient failures with exponentially growing delays.
#[derive(Clone, Copy, Debug)]
pub struct ExponentialBackoff {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32, error: &FetchError) -> Option<Duration> {
        if attempt > self.max_retries || !error.is_transient() {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(
            self.initial_delay
                .saturating_mul(factor)
                .min(self.max_delay),
        )
    }
}

/// Applies a [`RetryPolicy`] around any [`PredictionSource`].
pub struct RetryingPredictionSource {
    inner: Arc<dyn PredictionSource>,
    policy: Arc<dyn RetryPolicy>,
}

impl RetryingPredictionSource {
    pub fn new(inner: Arc<dyn PredictionSource>, policy: Arc<dyn RetryPolicy>) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl PredictionSource for RetryingPredictionSource {
    async fn fetch(&self, election_id: &ElectionId) -> Result<PredictionPayload, FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(election_id).await {
                Ok(payload) => return Ok(payload),
                Err(err) => match self.policy.next_delay(attempt, &err) {
                    Some(delay) => {
                        warn!(
                            "Prediction fetch for election={} failed (attempt {}): {}. Retrying in {:?}",
                            election_id, attempt, err, delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

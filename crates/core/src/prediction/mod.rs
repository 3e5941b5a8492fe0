//! Prediction fetching.

mod client;
mod retry;

pub use client::{HttpPredictionClient, PredictionPayload, PredictionSource};
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy, RetryingPredictionSource};

//! HTTP client for the external prediction service.
//!
//! Issues `GET <base>/predict?election_id=<id>` with a fixed timeout and
//! passes the response body through untouched.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::constants::DEFAULT_FETCH_TIMEOUT;
use crate::errors::FetchError;
use crate::events::ElectionId;

/// Opaque prediction result, forwarded to subscribers as-is.
pub type PredictionPayload = Value;

/// Anything that can produce a prediction for an election.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn fetch(&self, election_id: &ElectionId) -> Result<PredictionPayload, FetchError>;
}

/// Prediction service client over HTTP.
pub struct HttpPredictionClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPredictionClient {
    /// Create a client with the default 10 second timeout.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(FetchError::Client("prediction base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }
}

#[async_trait]
impl PredictionSource for HttpPredictionClient {
    async fn fetch(&self, election_id: &ElectionId) -> Result<PredictionPayload, FetchError> {
        let url = self.predict_url();
        debug!("Prediction request: {} election_id={}", url, election_id);

        let response = self
            .client
            .get(&url)
            .query(&[("election_id", election_id.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(format!("Failed to read response: {}", e))
            }
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Non-JSON bodies are forwarded as a plain string.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

//! Remote classifier oracle over HTTP.
//!
//! Each batch is one `POST` to the configured endpoint:
//!
//! ```text
//! request:  {"texts": ["first text", "second text"]}
//! response: {"predictions": [[0.9, 0.1], [0.2, 0.8]]}
//! ```
//!
//! Transport failures, timeouts, non-2xx statuses and malformed bodies all
//! surface as [`WordbugError::Oracle`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use wordbug_core::{Oracle, OracleConfig, Prediction, Result, WordbugError};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct ClassifyResponse {
    predictions: Vec<Vec<f64>>,
}

/// Oracle backed by a remote classification endpoint.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOracle {
    /// Create an oracle posting to `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WordbugError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create an oracle from the `oracle` config section.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if no endpoint is configured.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| WordbugError::Config("oracle.endpoint is not set".to_string()))?;
        Self::new(endpoint, Duration::from_millis(config.timeout_ms))
    }

    /// The endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        self.predict_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| WordbugError::Oracle("empty response from classifier".to_string()))
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(endpoint = %self.endpoint, batch = texts.len(), "Querying classifier");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { texts })
            .send()
            .await
            .map_err(|e| WordbugError::Oracle(format!("classifier request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WordbugError::Oracle(format!(
                "classifier returned {status}: {body}"
            )));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| WordbugError::Oracle(format!("malformed classifier response: {e}")))?;

        if parsed.predictions.len() != texts.len() {
            return Err(WordbugError::Oracle(format!(
                "classifier returned {} predictions for {} texts",
                parsed.predictions.len(),
                texts.len()
            )));
        }
        Ok(parsed.predictions.into_iter().map(Prediction::new).collect())
    }

    fn name(&self) -> &'static str {
        "HttpOracle"
    }
}

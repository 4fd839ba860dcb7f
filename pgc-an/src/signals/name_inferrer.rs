//! Name-based gender inferrer
//!
//! Queries a name-to-gender probability service with the first token of the
//! profile's display name:
//!
//! ```text
//! GET {base}?name=Jane  →  {"name": "Jane", "gender": "female", "probability": 0.98, "count": 1234}
//! ```
//!
//! The service's gender is accepted only when its probability strictly
//! exceeds the configured threshold (default 0.7).

use super::{InferenceError, NameInference};
use async_trait::async_trait;
use pgc_common::Gender;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for name service requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name service response body
#[derive(Debug, Clone, Deserialize)]
pub struct NameServiceResponse {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub probability: f64,
}

impl NameServiceResponse {
    /// Gender if reported with probability strictly above `threshold`
    pub fn accepted_gender(&self, threshold: f64) -> Option<Gender> {
        if self.probability > threshold {
            self.gender.as_deref().and_then(Gender::from_label)
        } else {
            None
        }
    }
}

/// First whitespace-delimited token of a display name
pub fn first_name(full_name: &str) -> Option<&str> {
    full_name.split_whitespace().next()
}

/// HTTP client for the name-to-gender service
pub struct NameServiceClient {
    http_client: reqwest::Client,
    base_url: String,
    min_probability: f64,
}

impl NameServiceClient {
    pub fn new(base_url: impl Into<String>, min_probability: f64) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|e| {
                    warn!("Falling back to default HTTP client: {}", e);
                    reqwest::Client::new()
                }),
            base_url: base_url.into(),
            min_probability,
        }
    }

    /// Query the service for one first name
    pub async fn lookup(&self, first_name: &str) -> Result<NameServiceResponse, InferenceError> {
        debug!("Querying name service for '{}'", first_name);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("name", first_name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::from_status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| InferenceError::Parse(e.to_string()))
    }

    /// Infer gender, surfacing the failure reason
    pub async fn try_infer(&self, full_name: &str) -> Result<Option<Gender>, InferenceError> {
        let Some(first) = first_name(full_name) else {
            return Ok(None);
        };

        let response = self.lookup(first).await?;
        let gender = response.accepted_gender(self.min_probability);

        debug!(
            "Name service: '{}' → {:?} (p={:.2}, accepted={:?})",
            first, response.gender, response.probability, gender
        );

        Ok(gender)
    }
}

#[async_trait]
impl NameInference for NameServiceClient {
    async fn infer_from_name(&self, full_name: &str) -> Option<Gender> {
        match self.try_infer(full_name).await {
            Ok(gender) => gender,
            Err(e) => {
                warn!("Name inference failed, treating as unknown: {}", e);
                None
            }
        }
    }
}

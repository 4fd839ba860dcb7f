//! Picture-based gender inferrer
//!
//! Downloads the profile picture, base64-encodes it and posts it to an
//! image-classification endpoint:
//!
//! ```text
//! POST {endpoint}  {"inputs": "<base64>"}
//!   → [{"label": "female", "score": 0.97}, {"label": "male", "score": 0.03}]
//! ```
//!
//! When an API token is configured the authenticated endpoint is tried first.
//! Its output shape is not relied upon: any error or inconclusive answer falls
//! through to the public endpoint.

use super::phrases::{detect_gender, detect_gender_substring};
use super::{InferenceError, PictureInference, TokenProvider};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pgc_common::Gender;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-request timeout; the sequencer's own deadline is shorter
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One classification prediction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Gender named by a classifier label
///
/// Whole words are tried first, then plain substrings with female checked
/// first, since every female substring contains a male one.
fn label_gender(label: &str) -> Option<Gender> {
    detect_gender(label).or_else(|| detect_gender_substring(label))
}

/// Map the first prediction to a gender
///
/// The label check applies regardless of score. A prediction carrying a
/// score above `score_threshold` gets the same check as a second pass.
pub fn interpret_predictions(predictions: &[Prediction], score_threshold: f64) -> Option<Gender> {
    let first = predictions.first()?;
    let label = first.label.as_deref()?;

    if let Some(gender) = label_gender(label) {
        return Some(gender);
    }

    match first.score {
        Some(score) if score > score_threshold => label_gender(label),
        _ => None,
    }
}

/// Outcome of one picture analysis, kept distinct for diagnostics
#[derive(Debug)]
pub enum PictureOutcome {
    Gender(Gender),
    /// Service answered but no gender could be read from it
    Inconclusive,
    Failed(InferenceError),
}

impl PictureOutcome {
    pub fn gender(&self) -> Option<Gender> {
        match self {
            PictureOutcome::Gender(gender) => Some(*gender),
            _ => None,
        }
    }
}

/// HTTP client for the image-classification service
pub struct ImageClassifierClient {
    http_client: reqwest::Client,
    public_url: String,
    authenticated_url: String,
    tokens: Arc<dyn TokenProvider>,
    score_threshold: f64,
}

impl ImageClassifierClient {
    pub fn new(
        public_url: impl Into<String>,
        authenticated_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
        score_threshold: f64,
    ) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|e| {
                    warn!("Falling back to default HTTP client: {}", e);
                    reqwest::Client::new()
                }),
            public_url: public_url.into(),
            authenticated_url: authenticated_url.into(),
            tokens,
            score_threshold,
        }
    }

    /// Download image bytes
    pub async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, InferenceError> {
        let response = self.http_client.get(image_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        debug!("Fetched profile picture ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Post a base64 payload to one classification endpoint
    pub async fn classify(
        &self,
        endpoint: &str,
        token: Option<&str>,
        payload: &str,
    ) -> Result<Option<Gender>, InferenceError> {
        let mut request = self
            .http_client
            .post(endpoint)
            .json(&json!({ "inputs": payload }));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::from_status(status.as_u16()));
        }

        let body = response.text().await?;
        let predictions: Vec<Prediction> =
            serde_json::from_str(&body).map_err(|e| InferenceError::Parse(e.to_string()))?;

        Ok(interpret_predictions(&predictions, self.score_threshold))
    }

    /// Full analysis: fetch, encode, authenticated pass (optional), public pass
    pub async fn analyze(&self, image_url: &str) -> PictureOutcome {
        let bytes = match self.fetch_image(image_url).await {
            Ok(bytes) => bytes,
            Err(e) => return PictureOutcome::Failed(e),
        };
        let payload = STANDARD.encode(&bytes);

        let token = self
            .tokens
            .api_token()
            .await
            .filter(|token| !token.trim().is_empty());

        if let Some(token) = token {
            match self
                .classify(&self.authenticated_url, Some(&token), &payload)
                .await
            {
                Ok(Some(gender)) => return PictureOutcome::Gender(gender),
                Ok(None) => debug!("Authenticated classifier inconclusive, trying public endpoint"),
                Err(e) => debug!("Authenticated classifier failed ({}), trying public endpoint", e),
            }
        }

        match self.classify(&self.public_url, None, &payload).await {
            Ok(Some(gender)) => PictureOutcome::Gender(gender),
            Ok(None) => PictureOutcome::Inconclusive,
            Err(e) => PictureOutcome::Failed(e),
        }
    }
}

#[async_trait]
impl PictureInference for ImageClassifierClient {
    async fn infer_from_picture(&self, image_url: &str) -> Option<Gender> {
        match self.analyze(image_url).await {
            PictureOutcome::Gender(gender) => Some(gender),
            PictureOutcome::Inconclusive => {
                debug!("Picture classification inconclusive");
                None
            }
            PictureOutcome::Failed(InferenceError::WarmingUp) => {
                info!("Classification model is loading, will retry on next check");
                None
            }
            PictureOutcome::Failed(e) if e.is_transient() => {
                info!("Picture inference unavailable ({}), will retry on next check", e);
                None
            }
            PictureOutcome::Failed(e) => {
                warn!("Picture inference failed, treating as unknown: {}", e);
                None
            }
        }
    }
}

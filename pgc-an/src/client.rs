//! Protocol client
//!
//! Sends cross-context requests to a running analyzer. A missing response
//! (connection refused, page context gone, unreadable body) is a delivery
//! failure: the call returns `None` and is not retried.

use pgc_common::protocol::{AnalyzeImageResponse, ForceCheckResponse, Request, SetApiTokenResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Upper bound for one request; `analyzeImage` may wait for the picture deadline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ProtocolClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ProtocolClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send one request; `None` when no usable response arrived
    pub async fn send<R: DeserializeOwned>(&self, request: &Request) -> Option<R> {
        let url = format!("{}/message", self.base_url);

        let response = match self.http_client.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("{} not delivered: {}", request.action(), e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("{} rejected with HTTP {}", request.action(), response.status());
            return None;
        }

        match response.json::<R>().await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!("{} response unreadable: {}", request.action(), e);
                None
            }
        }
    }

    pub async fn force_check(&self) -> Option<ForceCheckResponse> {
        self.send(&Request::ForceCheck).await
    }

    /// Store a token; `None` or an empty token clears it
    pub async fn set_api_token(&self, token: Option<String>) -> Option<SetApiTokenResponse> {
        self.send(&Request::SetApiToken { token }).await
    }

    pub async fn analyze_image(&self, image_url: &str) -> Option<AnalyzeImageResponse> {
        self.send(&Request::AnalyzeImage {
            image_url: image_url.to_string(),
        })
        .await
    }
}

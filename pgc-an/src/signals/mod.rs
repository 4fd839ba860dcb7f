//! Gender signal sources
//!
//! Three independent sources feed the reconciliation sequencer:
//! 1. **declared** - explicit phrases in the profile's "about" containers
//! 2. **name_inferrer** - external name-to-gender probability service
//! 3. **picture_inferrer** - external image-classification service
//!
//! Every source returns "nothing" on failure. Errors are logged where they
//! occur and never abort a run.

pub mod declared;
pub mod name_inferrer;
pub mod picture_inferrer;
pub mod phrases;

use async_trait::async_trait;
use pgc_common::Gender;
use std::fmt;
use thiserror::Error;

pub use declared::extract_declared;
pub use name_inferrer::NameServiceClient;
pub use picture_inferrer::{ImageClassifierClient, PictureOutcome};

/// Where a gender signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Declared,
    Name,
    Picture,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::Declared => write!(f, "declared"),
            SignalSource::Name => write!(f, "name"),
            SignalSource::Picture => write!(f, "picture"),
        }
    }
}

/// Gender value paired with its originating source, for diagnostics
///
/// `gender: None` is the "unknown" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenderSignal {
    pub source: SignalSource,
    pub gender: Option<Gender>,
}

impl GenderSignal {
    pub fn new(source: SignalSource, gender: Option<Gender>) -> Self {
        Self { source, gender }
    }
}

impl fmt::Display for GenderSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gender {
            Some(gender) => write!(f, "{} ({})", gender, self.source),
            None => write!(f, "unknown ({})", self.source),
        }
    }
}

/// Failure talking to an external inference service
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Connection, DNS, TLS or body transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 503: model is loading; worth retrying on a later run
    #[error("Service warming up (503)")]
    WarmingUp,

    /// Any other non-success HTTP status
    #[error("Service returned HTTP {0}")]
    Status(u16),

    /// Body could not be interpreted
    #[error("Unparseable response: {0}")]
    Parse(String),

    /// Caller-imposed deadline elapsed
    #[error("Timed out")]
    Timeout,
}

impl InferenceError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16) -> Self {
        match status {
            503 => InferenceError::WarmingUp,
            other => InferenceError::Status(other),
        }
    }

    /// Transient failures may succeed on a later run
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InferenceError::WarmingUp | InferenceError::Network(_) | InferenceError::Timeout
        )
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            InferenceError::Timeout
        } else if e.is_decode() {
            InferenceError::Parse(e.to_string())
        } else {
            InferenceError::Network(e.to_string())
        }
    }
}

/// Name-based gender inference
#[async_trait]
pub trait NameInference: Send + Sync {
    /// Infer from a full display name; `None` on low confidence or failure
    async fn infer_from_name(&self, full_name: &str) -> Option<Gender>;
}

/// Picture-based gender inference
#[async_trait]
pub trait PictureInference: Send + Sync {
    /// Infer from a profile picture URL; `None` on inconclusive result or failure
    async fn infer_from_picture(&self, image_url: &str) -> Option<Gender>;
}

/// Source of the optional classification API token
///
/// Read at the start of every inference attempt, never cached across runs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn api_token(&self) -> Option<String>;
}

/// Fixed token, used by one-shot runs and tests
pub struct StaticToken(pub Option<String>);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn api_token(&self) -> Option<String> {
        self.0.clone()
    }
}

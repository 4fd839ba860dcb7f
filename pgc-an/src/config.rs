//! API token resolution for pgc-an
//!
//! Multi-tier resolution with Database → ENV → TOML priority. The token is
//! optional: when none is configured only the public classifier is used.

use crate::db::settings;
use crate::signals::TokenProvider;
use async_trait::async_trait;
use pgc_common::config::PgcConfig;
use pgc_common::Result;
use sqlx::{Pool, Sqlite};
use std::fmt;
use tracing::{debug, warn};

/// Environment variable carrying the API token
pub const API_TOKEN_ENV_VAR: &str = "PGC_API_TOKEN";

/// Where a resolved token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Database,
    Environment,
    Toml,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Database => write!(f, "database"),
            TokenSource::Environment => write!(f, "environment"),
            TokenSource::Toml => write!(f, "TOML"),
        }
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

/// Resolve the API token from all tiers
pub async fn resolve_api_token(
    db: &Pool<Sqlite>,
    config: &PgcConfig,
) -> Result<Option<(String, TokenSource)>> {
    let db_token = settings::get_api_token(db).await?;
    Ok(pick_token(db_token, config))
}

/// Resolve the API token from ENV and TOML only, without touching the database
pub fn resolve_api_token_without_db(config: &PgcConfig) -> Option<(String, TokenSource)> {
    pick_token(None, config)
}

fn pick_token(db_token: Option<String>, config: &PgcConfig) -> Option<(String, TokenSource)> {
    let env_token = std::env::var(API_TOKEN_ENV_VAR).ok();
    let toml_token = config.api_token.clone();

    let candidates = [
        (db_token, TokenSource::Database),
        (env_token, TokenSource::Environment),
        (toml_token, TokenSource::Toml),
    ];

    let valid: Vec<(String, TokenSource)> = candidates
        .into_iter()
        .filter_map(|(token, source)| token.filter(|t| is_valid_token(t)).map(|t| (t, source)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<String> = valid.iter().map(|(_, source)| source.to_string()).collect();
        warn!(
            "API token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            valid[0].1
        );
    }

    valid.into_iter().next()
}

/// Token provider backed by the settings table, re-read on every request
pub struct SettingsTokenProvider {
    db: Pool<Sqlite>,
    config: PgcConfig,
}

impl SettingsTokenProvider {
    pub fn new(db: Pool<Sqlite>, config: PgcConfig) -> Self {
        Self { db, config }
    }
}

#[async_trait]
impl TokenProvider for SettingsTokenProvider {
    async fn api_token(&self) -> Option<String> {
        match resolve_api_token(&self.db, &self.config).await {
            Ok(Some((token, source))) => {
                debug!("Using API token from {}", source);
                Some(token)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read API token, continuing without: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

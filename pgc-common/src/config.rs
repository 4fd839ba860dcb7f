//! Bootstrap configuration loading
//!
//! The TOML file carries bootstrap concerns only: port, database location,
//! logging, external endpoints, timing and thresholds. A missing or
//! unreadable file is never fatal; the built-in defaults apply and a warning
//! is logged.
//!
//! Priority for the config file location:
//! 1. Command-line argument
//! 2. `PGC_CONFIG` environment variable
//! 3. `~/.config/pgc/pgc-an.toml` (platform config dir)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PGC_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PgcConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database holding the settings table
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Fallback API token (database value takes precedence)
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl Default for PgcConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            api_token: None,
            logging: LoggingConfig::default(),
            endpoints: EndpointConfig::default(),
            timing: TimingConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or EnvFilter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// External inference service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Public image-classification endpoint (no token)
    #[serde(default = "default_image_classifier_url")]
    pub image_classifier_url: String,

    /// Token-authenticated classification endpoint, tried first when a token exists
    #[serde(default = "default_authenticated_classifier_url")]
    pub authenticated_classifier_url: String,

    /// Name-to-gender probability service
    #[serde(default = "default_name_service_url")]
    pub name_service_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            image_classifier_url: default_image_classifier_url(),
            authenticated_classifier_url: default_authenticated_classifier_url(),
            name_service_url: default_name_service_url(),
        }
    }
}

/// Run timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Deadline for picture inference
    #[serde(default = "default_picture_timeout_ms")]
    pub picture_timeout_ms: u64,

    /// Quiet period after the last DOM mutation before re-running
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Lifetime of non-sticky status messages
    #[serde(default = "default_status_dismiss_ms")]
    pub status_dismiss_ms: u64,

    /// UI pacing delay after the extraction step message
    #[serde(default = "default_step_pacing_ms")]
    pub step_pacing_ms: u64,

    /// UI pacing delay after the compile step message
    #[serde(default = "default_compile_pacing_ms")]
    pub compile_pacing_ms: u64,
}

impl TimingConfig {
    pub fn picture_timeout(&self) -> Duration {
        Duration::from_millis(self.picture_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn status_dismiss(&self) -> Duration {
        Duration::from_millis(self.status_dismiss_ms)
    }

    pub fn step_pacing(&self) -> Duration {
        Duration::from_millis(self.step_pacing_ms)
    }

    pub fn compile_pacing(&self) -> Duration {
        Duration::from_millis(self.compile_pacing_ms)
    }

    /// Zero pacing, short deadlines; used by tests and one-shot CLI runs
    pub fn immediate() -> Self {
        Self {
            picture_timeout_ms: default_picture_timeout_ms(),
            debounce_ms: 0,
            status_dismiss_ms: default_status_dismiss_ms(),
            step_pacing_ms: 0,
            compile_pacing_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            picture_timeout_ms: default_picture_timeout_ms(),
            debounce_ms: default_debounce_ms(),
            status_dismiss_ms: default_status_dismiss_ms(),
            step_pacing_ms: default_step_pacing_ms(),
            compile_pacing_ms: default_compile_pacing_ms(),
        }
    }
}

/// Acceptance thresholds for probabilistic services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Name service result accepted only when probability exceeds this
    #[serde(default = "default_name_probability")]
    pub name_probability: f64,

    /// Loose label matching applies only when the score exceeds this
    #[serde(default = "default_picture_score")]
    pub picture_score: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            name_probability: default_name_probability(),
            picture_score: default_picture_score(),
        }
    }
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_image_classifier_url() -> String {
    "https://api-inference.huggingface.co/models/rizvandwiki/gender-classification".to_string()
}

fn default_authenticated_classifier_url() -> String {
    "https://api-inference.huggingface.co/models/caidas/swin-base-patch4-window7-224-in22k"
        .to_string()
}

fn default_name_service_url() -> String {
    "https://api.genderize.io".to_string()
}

fn default_picture_timeout_ms() -> u64 {
    20_000
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_status_dismiss_ms() -> u64 {
    5_000
}

fn default_step_pacing_ms() -> u64 {
    500
}

fn default_compile_pacing_ms() -> u64 {
    300
}

fn default_name_probability() -> f64 {
    0.7
}

fn default_picture_score() -> f64 {
    0.6
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pgc").join("pgc.db"))
        .unwrap_or_else(|| PathBuf::from("./pgc_data/pgc.db"))
}

/// Resolve the config file location (CLI → ENV → platform default)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("pgc").join("pgc-an.toml"))
}

/// Parse a config file, failing on unreadable or malformed content
pub fn read_toml_config(path: &Path) -> Result<PgcConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load config with graceful degradation
///
/// Missing file → defaults. Malformed file → warning + defaults.
pub fn load_config(path: Option<&Path>) -> PgcConfig {
    let Some(path) = path else {
        warn!("No config location available, using built-in defaults");
        return PgcConfig::default();
    };

    if !path.exists() {
        info!("Config file {} not found, using built-in defaults", path.display());
        return PgcConfig::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; using built-in defaults", e);
            PgcConfig::default()
        }
    }
}

/// Write a config file, creating parent directories
pub fn write_toml_config(config: &PgcConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

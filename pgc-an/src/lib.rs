//! pgc-an library interface
//!
//! Profile gender checker analyzer: classifies pushed page documents,
//! gathers declared/name/picture gender signals, reconciles them into a
//! verdict and keeps the page overlay that presents it.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod page;
pub mod sequencer;
pub mod signals;
pub mod sink;
pub mod watchdog;

pub use crate::error::{ApiError, ApiResult};

use crate::page::PageDocument;
use crate::sequencer::ReconciliationSequencer;
use crate::signals::{ImageClassifierClient, NameInference, NameServiceClient, PictureInference};
use crate::sink::OverlaySink;
use crate::watchdog::MutationWatchdog;
use axum::Router;
use chrono::{DateTime, Utc};
use pgc_common::config::PgcConfig;
use pgc_common::events::{EventBus, RunTrigger};
use pgc_common::RunId;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (settings table)
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub config: Arc<PgcConfig>,
    /// Most recent page document pushed by the page context
    pub page: Arc<RwLock<Option<PageDocument>>>,
    pub sequencer: Arc<ReconciliationSequencer>,
    /// Picture inferrer, also serving `analyzeImage` requests
    pub pictures: Arc<dyn PictureInference>,
    pub overlay: OverlaySink,
    pub watchdog: Arc<MutationWatchdog>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// State wired to the configured external services
    ///
    /// Must be called inside a Tokio runtime (spawns the watchdog loop).
    pub fn new(db: SqlitePool, event_bus: EventBus, config: PgcConfig) -> Self {
        let tokens = Arc::new(crate::config::SettingsTokenProvider::new(db.clone(), config.clone()));

        let names = Arc::new(NameServiceClient::new(
            config.endpoints.name_service_url.clone(),
            config.thresholds.name_probability,
        ));
        let pictures = Arc::new(ImageClassifierClient::new(
            config.endpoints.image_classifier_url.clone(),
            config.endpoints.authenticated_classifier_url.clone(),
            tokens,
            config.thresholds.picture_score,
        ));

        Self::with_services(db, event_bus, config, names, pictures)
    }

    /// State with explicit signal sources
    pub fn with_services(
        db: SqlitePool,
        event_bus: EventBus,
        config: PgcConfig,
        names: Arc<dyn NameInference>,
        pictures: Arc<dyn PictureInference>,
    ) -> Self {
        let overlay = OverlaySink::new(event_bus.clone(), config.timing.status_dismiss());

        let sequencer = Arc::new(ReconciliationSequencer::new(
            names,
            Arc::clone(&pictures),
            Arc::new(overlay.clone()),
            config.timing.clone(),
        ));

        let page: Arc<RwLock<Option<PageDocument>>> = Arc::new(RwLock::new(None));

        let watchdog = {
            let sequencer = Arc::clone(&sequencer);
            let page = Arc::clone(&page);
            MutationWatchdog::spawn(config.timing.debounce(), move || {
                let sequencer = Arc::clone(&sequencer);
                let page = Arc::clone(&page);
                async move {
                    let document = page.read().await.clone();
                    let _ = sequencer.spawn_run(RunTrigger::Navigation, document).await;
                }
            })
        };

        Self {
            db,
            event_bus,
            config: Arc::new(config),
            page,
            sequencer,
            pictures,
            overlay,
            watchdog: Arc::new(watchdog),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Start a run against the current page document
    pub async fn trigger_run(&self, trigger: RunTrigger) -> RunId {
        let document = self.page.read().await.clone();
        let (run_id, _handle) = self.sequencer.spawn_run(trigger, document).await;
        run_id
    }

    /// Replace the current page document
    pub async fn set_page(&self, document: PageDocument) {
        *self.page.write().await = Some(document);
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::page_routes())
        .merge(api::message_routes())
        .merge(api::overlay_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Cross-context protocol endpoint
//!
//! `POST /message` accepts the tagged requests of `pgc_common::protocol`.
//! `analyzeImage` holds the request open until picture inference resolves,
//! bounded by the picture timeout.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use pgc_common::events::{PgcEvent, RunTrigger};
use pgc_common::protocol::{
    AnalyzeImageResponse, ForceCheckResponse, Request, Response, SetApiTokenResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::is_valid_token;
use crate::db::settings;
use crate::sequencer::settle_within;
use crate::AppState;

/// POST /message
pub async fn handle_message(
    State(state): State<AppState>,
    Json(request): Json<Request>,
) -> Json<Response> {
    info!("Protocol request: {}", request.action());

    let response = match request {
        Request::AnalyzeImage { image_url } => {
            Response::AnalyzeImage(analyze_image(&state, image_url).await)
        }
        Request::SetApiToken { token } => {
            Response::SetApiToken(set_api_token(&state, token).await)
        }
        Request::ForceCheck => Response::ForceCheck(force_check(&state).await),
    };

    Json(response)
}

async fn analyze_image(state: &AppState, image_url: String) -> AnalyzeImageResponse {
    let pictures = Arc::clone(&state.pictures);
    let deadline = state.config.timing.picture_timeout();

    let gender = settle_within(
        async move { pictures.infer_from_picture(&image_url).await },
        deadline,
    )
    .await
    .flatten();

    AnalyzeImageResponse { gender }
}

async fn set_api_token(state: &AppState, token: Option<String>) -> SetApiTokenResponse {
    let token = token.filter(|t| is_valid_token(t));

    let result = match &token {
        Some(token) => settings::set_api_token(&state.db, token.trim()).await,
        None => settings::clear_api_token(&state.db).await,
    };

    match result {
        Ok(()) => {
            info!(
                "API token {}",
                if token.is_some() { "saved" } else { "cleared" }
            );
            state.event_bus.emit_lossy(PgcEvent::ApiTokenChanged {
                configured: token.is_some(),
                timestamp: Utc::now(),
            });
            SetApiTokenResponse {
                success: true,
                error: None,
            }
        }
        Err(e) => {
            warn!("Failed to store API token: {}", e);
            state.record_error(format!("Failed to store API token: {}", e)).await;
            SetApiTokenResponse {
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn force_check(state: &AppState) -> ForceCheckResponse {
    let run_id = state.trigger_run(RunTrigger::Manual).await;
    info!("Manual check initiated as {}", run_id);

    ForceCheckResponse {
        success: true,
        message: Some("Check initiated".to_string()),
    }
}

pub fn message_routes() -> Router<AppState> {
    Router::new().route("/message", post(handle_message))
}

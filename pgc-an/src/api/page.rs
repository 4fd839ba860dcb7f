//! Page context endpoints
//!
//! - `POST /page/load`: new document, automatic run starts immediately
//! - `POST /page/mutation`: updated document, run starts after the debounce

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use pgc_common::events::RunTrigger;
use pgc_common::RunId;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::page::PageDocument;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadResponse {
    pub run_id: RunId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMutationResponse {
    /// Quiet period before the re-check fires
    pub debounce_ms: u64,
}

fn validate(document: &PageDocument) -> ApiResult<()> {
    if document.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }
    Ok(())
}

/// POST /page/load
pub async fn page_load(
    State(state): State<AppState>,
    Json(document): Json<PageDocument>,
) -> ApiResult<(StatusCode, Json<PageLoadResponse>)> {
    validate(&document)?;
    debug!("Page load: {}", document.url);

    state.set_page(document).await;
    let run_id = state.trigger_run(RunTrigger::PageLoad).await;

    Ok((StatusCode::ACCEPTED, Json(PageLoadResponse { run_id })))
}

/// POST /page/mutation
pub async fn page_mutation(
    State(state): State<AppState>,
    Json(document): Json<PageDocument>,
) -> ApiResult<(StatusCode, Json<PageMutationResponse>)> {
    validate(&document)?;

    state.set_page(document).await;
    state.watchdog.notify();

    Ok((
        StatusCode::ACCEPTED,
        Json(PageMutationResponse {
            debounce_ms: state.watchdog.debounce().as_millis() as u64,
        }),
    ))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/page/load", post(page_load))
        .route("/page/mutation", post(page_mutation))
}

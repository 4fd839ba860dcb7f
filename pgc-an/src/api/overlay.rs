//! Overlay inspection endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::sink::Overlay;
use crate::AppState;

/// GET /overlay
///
/// Current badge, mismatch warning and status message.
pub async fn get_overlay(State(state): State<AppState>) -> Json<Overlay> {
    Json(state.overlay.snapshot().await)
}

pub fn overlay_routes() -> Router<AppState> {
    Router::new().route("/overlay", get(get_overlay))
}

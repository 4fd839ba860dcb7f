//! Server-Sent Events for overlay changes

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /events
///
/// Streams every `PgcEvent` (run started/skipped, status shown/dismissed,
/// verdict rendered/discarded, token changed) with the event type as the
/// SSE `event:` field.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let event_type = event.event_type().to_string();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting {}", event_type);
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: Client lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

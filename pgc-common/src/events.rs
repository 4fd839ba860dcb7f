//! Event types for the PGC event system
//!
//! Provides the shared event definitions and the EventBus used to broadcast
//! overlay changes to SSE subscribers.

use crate::verdict::{RunId, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What started an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// Page document received on load
    PageLoad,
    /// Debounced DOM mutation (single-page navigation)
    Navigation,
    /// Explicit user re-check; bypasses the page classifier
    Manual,
}

impl RunTrigger {
    /// Automatic triggers are gated by the page classifier
    pub fn is_automatic(&self) -> bool {
        !matches!(self, RunTrigger::Manual)
    }
}

/// PGC event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PgcEvent {
    /// A new run was initiated; any older run is now stale
    RunStarted {
        run_id: RunId,
        trigger: RunTrigger,
        timestamp: DateTime<Utc>,
    },

    /// Automatic run skipped because the page is not a profile
    RunSkipped {
        run_id: RunId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Transient progress message shown on the page
    StatusShown {
        run_id: RunId,
        message: String,
        /// Sticky messages (mismatch) are never auto-dismissed
        sticky: bool,
        timestamp: DateTime<Utc>,
    },

    /// Progress message removed (auto-dismiss or replacement)
    StatusDismissed {
        run_id: RunId,
        timestamp: DateTime<Utc>,
    },

    /// Verdict badge rendered, replacing any previous badge
    VerdictRendered {
        run_id: RunId,
        verdict: Verdict,
        /// Notification text, e.g. "Profile: male, Picture: female"
        summary: String,
        timestamp: DateTime<Utc>,
    },

    /// Verdict from a superseded run was rejected
    VerdictDiscarded {
        run_id: RunId,
        current_run_id: RunId,
        timestamp: DateTime<Utc>,
    },

    /// API token stored or cleared
    ApiTokenChanged {
        configured: bool,
        timestamp: DateTime<Utc>,
    },
}

impl PgcEvent {
    /// Event type name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            PgcEvent::RunStarted { .. } => "RunStarted",
            PgcEvent::RunSkipped { .. } => "RunSkipped",
            PgcEvent::StatusShown { .. } => "StatusShown",
            PgcEvent::StatusDismissed { .. } => "StatusDismissed",
            PgcEvent::VerdictRendered { .. } => "VerdictRendered",
            PgcEvent::VerdictDiscarded { .. } => "VerdictDiscarded",
            PgcEvent::ApiTokenChanged { .. } => "ApiTokenChanged",
        }
    }
}

/// Broadcast bus for PGC events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PgcEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PgcEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: PgcEvent) -> Result<usize, broadcast::error::SendError<PgcEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PgcEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

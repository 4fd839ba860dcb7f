//! Presentation sink
//!
//! The sequencer hands progress messages and verdicts to a [`PresentationSink`].
//! Every call is tagged with the run it belongs to; the sink tracks the most
//! recently initiated run and rejects anything older, so a lagging run can
//! never overwrite a newer verdict.
//!
//! [`OverlaySink`] keeps the current page overlay (badge, mismatch warning,
//! status message) in memory and broadcasts each change on the event bus.

use async_trait::async_trait;
use chrono::Utc;
use pgc_common::events::{EventBus, PgcEvent, RunTrigger};
use pgc_common::{PictureGender, ProfileGender, RunId, Verdict, VerdictStatus};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Result of a render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// Request came from a superseded run and was dropped
    Stale { current: RunId },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered)
    }
}

#[async_trait]
pub trait PresentationSink: Send + Sync {
    /// Record that `run` was initiated; older runs become stale
    async fn begin_run(&self, run: RunId, trigger: RunTrigger);

    /// Automatic run ended without analysis (page is not a profile)
    async fn run_skipped(&self, run: RunId, reason: &str);

    /// Show a short progress message, replacing the previous one
    async fn show_status(&self, run: RunId, message: &str) -> RenderOutcome;

    /// Show the verdict badge, removing any previous badge and warning first
    async fn render_verdict(&self, run: RunId, verdict: &Verdict) -> RenderOutcome;
}

/// Verdict badge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub title: &'static str,
    pub profile_gender: ProfileGender,
    pub picture_gender: PictureGender,
    pub status: VerdictStatus,
}

impl Badge {
    pub fn for_verdict(verdict: &Verdict) -> Self {
        Self {
            title: badge_title(verdict.status()),
            profile_gender: verdict.profile_gender(),
            picture_gender: verdict.picture_gender(),
            status: verdict.status(),
        }
    }
}

pub fn badge_title(status: VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Mismatch => "Gender Mismatch Detected",
        VerdictStatus::Match => "Gender Match",
        VerdictStatus::ProfileOnly | VerdictStatus::PictureOnly => "Partial Analysis",
        VerdictStatus::Unknown | VerdictStatus::Error => "Analysis Incomplete",
    }
}

/// Banner shown only while the current verdict is a mismatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchWarning {
    pub text: String,
}

impl MismatchWarning {
    pub fn new(profile: ProfileGender, picture: PictureGender) -> Self {
        Self {
            text: format!(
                "Gender Mismatch Detected: Profile indicates {}, but profile picture suggests {}",
                profile, picture
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    /// Sticky messages are never auto-dismissed
    pub sticky: bool,
    #[serde(skip)]
    seq: u64,
}

/// Messages mentioning a mismatch stay until replaced
pub fn is_sticky(message: &str) -> bool {
    message.to_ascii_lowercase().contains("mismatch")
}

/// Current page overlay
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overlay {
    /// Most recently initiated run
    pub current_run: Option<RunId>,
    /// Run whose verdict the badge shows
    pub rendered_run: Option<RunId>,
    pub badge: Option<Badge>,
    pub warning: Option<MismatchWarning>,
    pub status: Option<StatusMessage>,
    /// Notification text for the rendered verdict
    pub summary: Option<String>,
}

#[derive(Debug, Default)]
struct OverlayState {
    latest_run: RunId,
    overlay: Overlay,
    status_seq: u64,
}

impl OverlayState {
    fn stale(&self, run: RunId) -> Option<RunId> {
        (run < self.latest_run).then_some(self.latest_run)
    }
}

/// In-memory overlay renderer
#[derive(Clone)]
pub struct OverlaySink {
    state: Arc<RwLock<OverlayState>>,
    event_bus: EventBus,
    dismiss_after: Duration,
}

impl OverlaySink {
    pub fn new(event_bus: EventBus, dismiss_after: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(OverlayState::default())),
            event_bus,
            dismiss_after,
        }
    }

    /// Copy of the current overlay
    pub async fn snapshot(&self) -> Overlay {
        self.state.read().await.overlay.clone()
    }

    /// Most recently initiated run, if any
    pub async fn current_run(&self) -> Option<RunId> {
        self.state.read().await.overlay.current_run
    }

    fn schedule_dismiss(&self, run: RunId, seq: u64) {
        let state = Arc::clone(&self.state);
        let event_bus = self.event_bus.clone();
        let delay = self.dismiss_after;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = state.write().await;
            let still_shown = state
                .overlay
                .status
                .as_ref()
                .is_some_and(|status| status.seq == seq);

            if still_shown {
                state.overlay.status = None;
                drop(state);
                event_bus.emit_lossy(PgcEvent::StatusDismissed {
                    run_id: run,
                    timestamp: Utc::now(),
                });
            }
        });
    }
}

#[async_trait]
impl PresentationSink for OverlaySink {
    async fn begin_run(&self, run: RunId, trigger: RunTrigger) {
        {
            let mut state = self.state.write().await;
            if run > state.latest_run {
                state.latest_run = run;
            }
            state.overlay.current_run = Some(state.latest_run);
        }

        debug!("{} initiated ({:?})", run, trigger);
        self.event_bus.emit_lossy(PgcEvent::RunStarted {
            run_id: run,
            trigger,
            timestamp: Utc::now(),
        });
    }

    async fn run_skipped(&self, run: RunId, reason: &str) {
        debug!("{} skipped: {}", run, reason);
        self.event_bus.emit_lossy(PgcEvent::RunSkipped {
            run_id: run,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    async fn show_status(&self, run: RunId, message: &str) -> RenderOutcome {
        let sticky = is_sticky(message);

        let seq = {
            let mut state = self.state.write().await;
            if let Some(current) = state.stale(run) {
                debug!("Dropping status from stale {} (current {})", run, current);
                return RenderOutcome::Stale { current };
            }

            state.status_seq += 1;
            let seq = state.status_seq;
            state.overlay.status = Some(StatusMessage {
                text: message.to_string(),
                sticky,
                seq,
            });
            seq
        };

        self.event_bus.emit_lossy(PgcEvent::StatusShown {
            run_id: run,
            message: message.to_string(),
            sticky,
            timestamp: Utc::now(),
        });

        if !sticky {
            self.schedule_dismiss(run, seq);
        }

        RenderOutcome::Rendered
    }

    async fn render_verdict(&self, run: RunId, verdict: &Verdict) -> RenderOutcome {
        let summary = verdict.summary();

        {
            let mut state = self.state.write().await;
            if let Some(current) = state.stale(run) {
                drop(state);
                info!("Discarding verdict from stale {} (current {})", run, current);
                self.event_bus.emit_lossy(PgcEvent::VerdictDiscarded {
                    run_id: run,
                    current_run_id: current,
                    timestamp: Utc::now(),
                });
                return RenderOutcome::Stale { current };
            }

            let overlay = &mut state.overlay;
            overlay.badge = None;
            overlay.warning = None;

            if verdict.is_mismatch() {
                overlay.warning = Some(MismatchWarning::new(
                    verdict.profile_gender(),
                    verdict.picture_gender(),
                ));
            }
            overlay.badge = Some(Badge::for_verdict(verdict));
            overlay.rendered_run = Some(run);
            overlay.summary = Some(summary.clone());
        }

        info!("{} verdict: {} ({})", run, verdict.status(), summary);
        self.event_bus.emit_lossy(PgcEvent::VerdictRendered {
            run_id: run,
            verdict: verdict.clone(),
            summary,
            timestamp: Utc::now(),
        });

        RenderOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgc_common::Gender;

    fn sink() -> OverlaySink {
        OverlaySink::new(EventBus::new(32), Duration::from_millis(30))
    }

    fn mismatch() -> Verdict {
        Verdict::new(ProfileGender::Male, PictureGender::Female)
    }

    #[tokio::test]
    async fn test_mismatch_shows_badge_and_warning() {
        let sink = sink();
        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;

        assert!(sink.render_verdict(RunId(1), &mismatch()).await.is_rendered());

        let overlay = sink.snapshot().await;
        let badge = overlay.badge.expect("badge");
        assert_eq!(badge.title, "Gender Mismatch Detected");
        assert_eq!(
            overlay.warning.expect("warning").text,
            "Gender Mismatch Detected: Profile indicates male, but profile picture suggests female"
        );
        assert_eq!(overlay.summary.as_deref(), Some("Profile: male, Picture: female"));
    }

    #[tokio::test]
    async fn test_non_mismatch_removes_warning() {
        let sink = sink();
        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;
        sink.render_verdict(RunId(1), &mismatch()).await;

        sink.begin_run(RunId(2), RunTrigger::Manual).await;
        let matched = Verdict::new(ProfileGender::Female, Gender::Female.into());
        sink.render_verdict(RunId(2), &matched).await;

        let overlay = sink.snapshot().await;
        assert!(overlay.warning.is_none());
        assert_eq!(overlay.badge.expect("badge").title, "Gender Match");
        assert_eq!(overlay.rendered_run, Some(RunId(2)));
    }

    #[tokio::test]
    async fn test_stale_verdict_rejected() {
        let sink = sink();
        let mut rx = sink.event_bus.subscribe();

        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;
        sink.begin_run(RunId(2), RunTrigger::Navigation).await;

        let newer = Verdict::new(ProfileGender::Female, PictureGender::NotAnalyzed);
        assert!(sink.render_verdict(RunId(2), &newer).await.is_rendered());
        assert_eq!(
            sink.render_verdict(RunId(1), &mismatch()).await,
            RenderOutcome::Stale { current: RunId(2) }
        );

        let overlay = sink.snapshot().await;
        assert_eq!(overlay.rendered_run, Some(RunId(2)));
        assert_eq!(overlay.badge.expect("badge").title, "Partial Analysis");

        let mut discarded = false;
        while let Ok(event) = rx.try_recv() {
            if let PgcEvent::VerdictDiscarded {
                run_id,
                current_run_id,
                ..
            } = event
            {
                assert_eq!(run_id, RunId(1));
                assert_eq!(current_run_id, RunId(2));
                discarded = true;
            }
        }
        assert!(discarded);
    }

    #[tokio::test]
    async fn test_stale_status_rejected() {
        let sink = sink();
        sink.begin_run(RunId(3), RunTrigger::Manual).await;
        assert_eq!(
            sink.show_status(RunId(2), "Step 2: Analyzing profile picture...").await,
            RenderOutcome::Stale { current: RunId(3) }
        );
        assert!(sink.snapshot().await.status.is_none());
    }

    #[tokio::test]
    async fn test_status_auto_dismiss() {
        let sink = sink();
        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;
        sink.show_status(RunId(1), "Analyzing profile...").await;
        assert!(sink.snapshot().await.status.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(sink.snapshot().await.status.is_none());
    }

    #[tokio::test]
    async fn test_mismatch_status_is_sticky() {
        let sink = sink();
        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;
        sink.show_status(RunId(1), "Mismatch detected - see badge").await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        let status = sink.snapshot().await.status.expect("sticky status");
        assert!(status.sticky);
    }

    #[tokio::test]
    async fn test_replaced_status_not_dismissed_early() {
        let sink = OverlaySink::new(EventBus::new(8), Duration::from_millis(80));
        sink.begin_run(RunId(1), RunTrigger::PageLoad).await;
        sink.show_status(RunId(1), "Step 1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        sink.show_status(RunId(1), "Step 2").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // First message's timer fired, but it no longer owns the slot
        let status = sink.snapshot().await.status.expect("status");
        assert_eq!(status.text, "Step 2");
    }

    #[test]
    fn test_badge_titles() {
        assert_eq!(badge_title(VerdictStatus::PictureOnly), "Partial Analysis");
        assert_eq!(badge_title(VerdictStatus::Unknown), "Analysis Incomplete");
        assert_eq!(badge_title(VerdictStatus::Error), "Analysis Incomplete");
    }
}

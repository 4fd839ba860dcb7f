//! Reconciliation sequencer
//!
//! Drives one analysis run through its states:
//!
//! ```text
//! Idle → Extracting → (InferringName) → InferringPicture → Reconciled
//! ```
//!
//! Each run is tagged with a [`RunId`] from a monotonically increasing
//! generator and the tag travels with every call into the presentation sink.
//! A newer run does not cancel an older one; the sink drops the older run's
//! output instead.
//!
//! Page parsing happens in [`prepare`], a synchronous step, because parsed
//! DOM snapshots cannot be held across an `.await`.

pub mod race;
pub mod reconcile;

use crate::page::{classify, extract_snapshot, PageDocument, ProfileSnapshot};
use crate::signals::{GenderSignal, NameInference, PictureInference, SignalSource};
use crate::sink::{PresentationSink, RenderOutcome};
use chrono::{DateTime, Utc};
use pgc_common::config::TimingConfig;
use pgc_common::events::RunTrigger;
use pgc_common::{Gender, RunId, Verdict};
use reconcile::{completion_message, reconcile, PictureSignal};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use race::{first_settled, settle_within, Settled};

/// States of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Extracting,
    InferringName,
    InferringPicture,
    Reconciled,
}

/// Issues run identifiers; later calls always return larger ids
#[derive(Debug, Default)]
pub struct RunIdGenerator {
    last: AtomicU64,
}

impl RunIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> RunId {
        RunId(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recently issued id, if any
    pub fn last_issued(&self) -> Option<RunId> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RunId(n)),
        }
    }
}

/// Per-run context passed through every step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub run_id: RunId,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// Automatic run on a page that is not a profile
    Skipped { run_id: RunId, reason: String },
    Completed {
        run_id: RunId,
        verdict: Verdict,
        /// Whether the sink accepted the verdict or found it stale
        outcome: RenderOutcome,
        /// States visited, in order
        trail: Vec<RunState>,
    },
}

impl RunReport {
    pub fn run_id(&self) -> RunId {
        match self {
            RunReport::Skipped { run_id, .. } | RunReport::Completed { run_id, .. } => *run_id,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            RunReport::Completed { verdict, .. } => Some(verdict),
            RunReport::Skipped { .. } => None,
        }
    }
}

/// Outcome of the synchronous page step
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    NotProfile(String),
    Ready(ProfileSnapshot),
}

/// Classify (automatic triggers only) and extract the profile snapshot
pub fn prepare(trigger: RunTrigger, page: &PageDocument) -> Prepared {
    let dom = page.snapshot();

    if trigger.is_automatic() {
        let classification = classify(&page.url, &dom);
        if !classification.is_profile {
            let reason = if classification.excluded {
                format!("Excluded page: {}", page.url)
            } else {
                format!("Not a profile page: {}", page.url)
            };
            return Prepared::NotProfile(reason);
        }
    }

    Prepared::Ready(extract_snapshot(&dom))
}

/// Orchestrates signal sources and hands results to the presentation sink
pub struct ReconciliationSequencer {
    ids: RunIdGenerator,
    names: Arc<dyn NameInference>,
    pictures: Arc<dyn PictureInference>,
    sink: Arc<dyn PresentationSink>,
    timing: TimingConfig,
}

impl ReconciliationSequencer {
    pub fn new(
        names: Arc<dyn NameInference>,
        pictures: Arc<dyn PictureInference>,
        sink: Arc<dyn PresentationSink>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            ids: RunIdGenerator::new(),
            names,
            pictures,
            sink,
            timing,
        }
    }

    pub fn last_run(&self) -> Option<RunId> {
        self.ids.last_issued()
    }

    /// Initiate a run; from here on every older run is stale
    pub async fn start(&self, trigger: RunTrigger) -> RunContext {
        let ctx = RunContext {
            run_id: self.ids.next_id(),
            trigger,
            started_at: Utc::now(),
        };

        info!("Starting {} ({:?})", ctx.run_id, trigger);
        self.sink.begin_run(ctx.run_id, trigger).await;

        if trigger == RunTrigger::Manual {
            self.status(&ctx, "Manual check triggered - analyzing...").await;
        }

        ctx
    }

    /// Start and execute a run to completion
    pub async fn run(&self, trigger: RunTrigger, page: Option<PageDocument>) -> RunReport {
        let ctx = self.start(trigger).await;
        self.execute(ctx, page).await
    }

    /// Initiate a run now, execute it in the background
    ///
    /// The run id is issued before this returns, so runs are ordered by call order.
    pub async fn spawn_run(
        self: &Arc<Self>,
        trigger: RunTrigger,
        page: Option<PageDocument>,
    ) -> (RunId, JoinHandle<RunReport>) {
        let ctx = self.start(trigger).await;
        let sequencer = Arc::clone(self);
        let handle = tokio::spawn(async move { sequencer.execute(ctx, page).await });
        (ctx.run_id, handle)
    }

    /// Execute an initiated run
    pub async fn execute(&self, ctx: RunContext, page: Option<PageDocument>) -> RunReport {
        let mut trail = vec![RunState::Idle];

        let Some(page) = page else {
            info!("{}: no page document, rendering error verdict", ctx.run_id);
            return self.finish(&ctx, Verdict::error(), trail).await;
        };

        let snapshot = match prepare(ctx.trigger, &page) {
            Prepared::NotProfile(reason) => {
                info!("{}: skipped ({})", ctx.run_id, reason);
                self.sink.run_skipped(ctx.run_id, &reason).await;
                return RunReport::Skipped {
                    run_id: ctx.run_id,
                    reason,
                };
            }
            Prepared::Ready(snapshot) => snapshot,
        };

        self.transition(&ctx, &mut trail, RunState::Extracting);
        self.status(&ctx, "Analyzing profile...").await;

        let mut profile_gender = snapshot.declared_gender();
        debug!(
            "{}: {}",
            ctx.run_id,
            GenderSignal::new(SignalSource::Declared, profile_gender)
        );
        if profile_gender.is_none() {
            if let Some(name) = snapshot.name() {
                self.transition(&ctx, &mut trail, RunState::InferringName);
                self.status(&ctx, "Inferring gender from name...").await;
                profile_gender = self.names.infer_from_name(name).await;
                debug!(
                    "{}: {}",
                    ctx.run_id,
                    GenderSignal::new(SignalSource::Name, profile_gender)
                );
            }
        }

        self.status(&ctx, "Step 1: Extracting profile information...").await;
        pace(self.timing.step_pacing()).await;

        let picture = match snapshot.profile_picture_url() {
            None => {
                self.status(&ctx, "No profile picture found").await;
                PictureSignal::NotCaptured
            }
            Some(url) => {
                self.transition(&ctx, &mut trail, RunState::InferringPicture);
                self.status(&ctx, "Step 2: Analyzing profile picture...").await;

                let gender = self.infer_picture(&ctx, url).await;

                self.status(&ctx, "Step 3: Compiling results...").await;
                pace(self.timing.compile_pacing()).await;
                PictureSignal::Inferred(gender)
            }
        };

        let verdict = reconcile(profile_gender, picture);
        self.finish(&ctx, verdict, trail).await
    }

    /// Picture inference raced against the deadline; the loser is discarded
    async fn infer_picture(&self, ctx: &RunContext, url: &str) -> Option<Gender> {
        let pictures = Arc::clone(&self.pictures);
        let url = url.to_string();
        let deadline = self.timing.picture_timeout();

        let result = settle_within(
            async move { pictures.infer_from_picture(&url).await },
            deadline,
        )
        .await;

        let gender = match result {
            Some(gender) => gender,
            None => {
                info!("{}: picture inference gave no result within {:?}", ctx.run_id, deadline);
                None
            }
        };
        debug!("{}: {}", ctx.run_id, GenderSignal::new(SignalSource::Picture, gender));
        gender
    }

    async fn finish(&self, ctx: &RunContext, verdict: Verdict, mut trail: Vec<RunState>) -> RunReport {
        self.transition(ctx, &mut trail, RunState::Reconciled);

        let outcome = self.sink.render_verdict(ctx.run_id, &verdict).await;
        if outcome.is_rendered() {
            self.status(ctx, completion_message(&verdict)).await;
        }

        RunReport::Completed {
            run_id: ctx.run_id,
            verdict,
            outcome,
            trail,
        }
    }

    fn transition(&self, ctx: &RunContext, trail: &mut Vec<RunState>, next: RunState) {
        debug!("{}: {:?} → {:?}", ctx.run_id, trail.last(), next);
        trail.push(next);
    }

    async fn status(&self, ctx: &RunContext, message: &str) {
        if let RenderOutcome::Stale { current } = self.sink.show_status(ctx.run_id, message).await
        {
            debug!("{}: superseded by {}, status dropped", ctx.run_id, current);
        }
    }
}

async fn pace(delay: std::time::Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

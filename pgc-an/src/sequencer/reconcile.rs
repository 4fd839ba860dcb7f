//! Reconciliation policy
//!
//! Combines the profile-side and picture-side signals into one [`Verdict`]
//! and picks the closing status message for the run.

use pgc_common::{Gender, PictureGender, ProfileGender, Verdict, VerdictStatus};

/// Picture-side input to reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureSignal {
    /// No picture URL was captured; inference never ran
    NotCaptured,
    /// Inference ran (or timed out); `None` when it produced nothing
    Inferred(Option<Gender>),
}

impl PictureSignal {
    pub fn gender(&self) -> Option<Gender> {
        match self {
            PictureSignal::NotCaptured => None,
            PictureSignal::Inferred(gender) => *gender,
        }
    }
}

impl From<PictureSignal> for PictureGender {
    fn from(signal: PictureSignal) -> Self {
        match signal {
            PictureSignal::NotCaptured => PictureGender::NotAnalyzed,
            PictureSignal::Inferred(Some(gender)) => gender.into(),
            PictureSignal::Inferred(None) => PictureGender::AnalysisFailed,
        }
    }
}

/// Merge the two signals; status follows from which resolved and whether they agree
pub fn reconcile(profile: Option<Gender>, picture: PictureSignal) -> Verdict {
    Verdict::new(ProfileGender::from(profile), PictureGender::from(picture))
}

/// Closing status message for a reconciled verdict
pub fn completion_message(verdict: &Verdict) -> &'static str {
    match verdict.status() {
        VerdictStatus::Mismatch => "Mismatch detected - see badge",
        VerdictStatus::Match => "Analysis complete - genders match",
        VerdictStatus::ProfileOnly | VerdictStatus::PictureOnly => "Analysis complete - check badge",
        VerdictStatus::Unknown if verdict.picture_gender() == PictureGender::NotAnalyzed => {
            "Limited data - check badge"
        }
        VerdictStatus::Unknown => "Analysis complete - limited data",
        VerdictStatus::Error => "Error: No profile data found",
    }
}

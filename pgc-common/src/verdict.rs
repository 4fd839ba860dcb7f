//! Gender and verdict domain types
//!
//! A [`Verdict`] is the single record produced by one analysis run. Its
//! `status` is always derived from the two gender fields, so a verdict can
//! never claim a mismatch the fields do not support.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete gender value produced by a signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a service-reported gender string ("male"/"female", any case)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile-side gender as presented in a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileGender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "error")]
    Error,
}

impl ProfileGender {
    pub fn gender(&self) -> Option<Gender> {
        match self {
            ProfileGender::Male => Some(Gender::Male),
            ProfileGender::Female => Some(Gender::Female),
            _ => None,
        }
    }
}

impl From<Option<Gender>> for ProfileGender {
    fn from(value: Option<Gender>) -> Self {
        match value {
            Some(Gender::Male) => ProfileGender::Male,
            Some(Gender::Female) => ProfileGender::Female,
            None => ProfileGender::NotFound,
        }
    }
}

impl fmt::Display for ProfileGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileGender::Male => write!(f, "male"),
            ProfileGender::Female => write!(f, "female"),
            ProfileGender::NotFound => write!(f, "not found"),
            ProfileGender::Error => write!(f, "error"),
        }
    }
}

/// Picture-side gender as presented in a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PictureGender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    /// No picture was captured, so inference never ran
    #[serde(rename = "not analyzed")]
    NotAnalyzed,
    /// Inference ran but produced nothing (failure, timeout, inconclusive)
    #[serde(rename = "analysis failed")]
    AnalysisFailed,
}

impl PictureGender {
    pub fn gender(&self) -> Option<Gender> {
        match self {
            PictureGender::Male => Some(Gender::Male),
            PictureGender::Female => Some(Gender::Female),
            _ => None,
        }
    }
}

impl From<Gender> for PictureGender {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Male => PictureGender::Male,
            Gender::Female => PictureGender::Female,
        }
    }
}

impl fmt::Display for PictureGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PictureGender::Male => write!(f, "male"),
            PictureGender::Female => write!(f, "female"),
            PictureGender::NotAnalyzed => write!(f, "not analyzed"),
            PictureGender::AnalysisFailed => write!(f, "analysis failed"),
        }
    }
}

/// Verdict status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Mismatch,
    Match,
    ProfileOnly,
    PictureOnly,
    Unknown,
    Error,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictStatus::Mismatch => write!(f, "mismatch"),
            VerdictStatus::Match => write!(f, "match"),
            VerdictStatus::ProfileOnly => write!(f, "profile_only"),
            VerdictStatus::PictureOnly => write!(f, "picture_only"),
            VerdictStatus::Unknown => write!(f, "unknown"),
            VerdictStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    profile_gender: ProfileGender,
    picture_gender: PictureGender,
    status: VerdictStatus,
}

impl Verdict {
    /// Build a verdict from the two resolved signals, deriving the status
    pub fn new(profile_gender: ProfileGender, picture_gender: PictureGender) -> Self {
        let status = match (profile_gender.gender(), picture_gender.gender()) {
            (Some(profile), Some(picture)) if profile != picture => VerdictStatus::Mismatch,
            (Some(_), Some(_)) => VerdictStatus::Match,
            (Some(_), None) => VerdictStatus::ProfileOnly,
            (None, Some(_)) => VerdictStatus::PictureOnly,
            (None, None) => VerdictStatus::Unknown,
        };

        Self {
            profile_gender,
            picture_gender,
            status,
        }
    }

    /// Verdict for a run that had no page snapshot to work from
    pub fn error() -> Self {
        Self {
            profile_gender: ProfileGender::Error,
            picture_gender: PictureGender::NotAnalyzed,
            status: VerdictStatus::Error,
        }
    }

    pub fn profile_gender(&self) -> ProfileGender {
        self.profile_gender
    }

    pub fn picture_gender(&self) -> PictureGender {
        self.picture_gender
    }

    pub fn status(&self) -> VerdictStatus {
        self.status
    }

    pub fn is_mismatch(&self) -> bool {
        self.status == VerdictStatus::Mismatch
    }

    /// One-line summary used for notifications
    pub fn summary(&self) -> String {
        format!(
            "Profile: {}, Picture: {}",
            self.profile_gender, self.picture_gender
        )
    }
}

/// Monotonically increasing identifier of an analysis run
///
/// Later runs always compare greater than earlier ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

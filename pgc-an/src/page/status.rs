//! Quick page status for the control surface
//!
//! Looser than the classifier: URL only, no DOM evidence. Used to tell the
//! user whether analysis should be expected on the active page.

use super::classifier::is_profile_host;
use serde::Serialize;
use url::Url;

const STATUS_EXCLUSIONS: &[&str] = &["/messages/", "/groups/", "/pages/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    NotSupportedSite,
    NotProfile,
    Profile,
}

impl PageStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PageStatus::NotSupportedSite => {
                "Not on a supported site. Navigate to a profile page."
            }
            PageStatus::NotProfile => {
                "Not on a profile page. Go to someone's profile to see analysis."
            }
            PageStatus::Profile => "On a profile page. Analysis should appear on the page.",
        }
    }
}

pub fn page_status(url: &str) -> PageStatus {
    let Some(parsed) = Url::parse(url).ok() else {
        return PageStatus::NotSupportedSite;
    };
    if !parsed.host_str().is_some_and(is_profile_host) {
        return PageStatus::NotSupportedSite;
    }
    if STATUS_EXCLUSIONS.iter().any(|fragment| url.contains(fragment)) {
        return PageStatus::NotProfile;
    }

    if looks_like_profile(&parsed) {
        PageStatus::Profile
    } else {
        PageStatus::NotProfile
    }
}

fn looks_like_profile(url: &Url) -> bool {
    let path = url.path();

    if path == "/profile.php" {
        let numeric_id = url
            .query()
            .and_then(|q| q.strip_prefix("id="))
            .is_some_and(|id| id.starts_with(|c: char| c.is_ascii_digit()));
        if numeric_id {
            return true;
        }
    }

    if path
        .strip_prefix("/people/")
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
    {
        return true;
    }

    // First path segment made of username characters, followed by `/` or end
    let segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
}

//! Page classifier
//!
//! Decides whether a page is a personal profile eligible for analysis.
//! Three checks, all required:
//! 1. URL contains none of the excluded path fragments
//! 2. URL has a profile shape (numeric id, bare username, people listing)
//! 3. DOM shows profile evidence: (picture AND name heading) OR structure container
//!
//! Pure function over the current document state.

use super::selectors::{PROFILE_NAME_EVIDENCE, PROFILE_PICTURE_EVIDENCE, PROFILE_STRUCTURE_EVIDENCE};
use super::strategy::StrategyChain;
use super::DomSnapshot;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Non-profile areas of the site; matched as substrings of the full URL
pub const EXCLUDED_PATH_FRAGMENTS: &[&str] = &[
    "/groups/", "/pages/", "/events/", "/marketplace/", "/watch/",
    "/login", "/signup", "/recover", "/help", "/about", "/privacy",
    "/settings", "/messages", "/notifications", "/bookmarks",
    "/games/", "/apps/", "/developers/", "/business/", "/ads/",
    "/stories/", "/reels/", "/video/", "/photo/", "/post/",
    "/p/", "/story/", "/permalink/", "/hashtag/", "/search/",
    "/home", "/feed", "/newsfeed",
];

/// Hosts serving profile pages
pub const PROFILE_HOSTS: &[&str] = &["facebook.com", "www.facebook.com"];

/// Recognized profile URL shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileUrlKind {
    /// `/profile.php?id=123`
    NumericId,
    /// `/jane.doe` or `/jane.doe/`
    Username,
    /// `/people/<name>/...`
    People,
}

/// Whether the URL contains an excluded path fragment
pub fn is_excluded(url: &str) -> bool {
    EXCLUDED_PATH_FRAGMENTS
        .iter()
        .any(|fragment| url.contains(fragment))
}

/// Whether `host` belongs to the supported site
pub fn is_profile_host(host: &str) -> bool {
    PROFILE_HOSTS.contains(&host)
}

/// Match the URL against the profile shapes
pub fn profile_url_kind(url: &str) -> Option<ProfileUrlKind> {
    let parsed = Url::parse(url).ok()?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    if !parsed.host_str().is_some_and(is_profile_host) {
        return None;
    }

    let path = parsed.path();

    if path == "/profile.php" {
        if let Some(id) = parsed.query().and_then(|q| q.strip_prefix("id=")) {
            if id.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return Some(ProfileUrlKind::NumericId);
            }
        }
    }

    // The bare listing root is not a profile and must not reach the username check
    if let Some(rest) = path.strip_prefix("/people/") {
        return rest
            .split('/')
            .next()
            .is_some_and(|name| !name.is_empty())
            .then_some(ProfileUrlKind::People);
    }

    if parsed.query().is_none() && parsed.fragment().is_none() {
        let segment = path.trim_start_matches('/');
        let segment = segment.strip_suffix('/').unwrap_or(segment);
        if is_username(segment) {
            return Some(ProfileUrlKind::Username);
        }
    }

    None
}

fn is_username(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
}

/// Profile evidence found in the DOM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomEvidence {
    pub picture: bool,
    pub name: bool,
    pub structure: bool,
}

impl DomEvidence {
    pub fn collect(dom: &DomSnapshot) -> Self {
        Self {
            picture: StrategyChain::presence("profile picture", PROFILE_PICTURE_EVIDENCE)
                .any_present(dom),
            name: StrategyChain::presence("profile name", PROFILE_NAME_EVIDENCE).any_present(dom),
            structure: StrategyChain::presence("profile structure", PROFILE_STRUCTURE_EVIDENCE)
                .any_present(dom),
        }
    }

    /// Picture and name together, or a structure container on its own
    pub fn is_sufficient(&self) -> bool {
        (self.picture && self.name) || self.structure
    }
}

/// Full classifier result, kept for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub excluded: bool,
    pub url_kind: Option<ProfileUrlKind>,
    pub evidence: DomEvidence,
    pub is_profile: bool,
}

/// Classify a page from its URL and DOM snapshot
pub fn classify(url: &str, dom: &DomSnapshot) -> Classification {
    if is_excluded(url) {
        debug!("Excluded page: {}", url);
        return Classification {
            excluded: true,
            url_kind: None,
            evidence: DomEvidence::default(),
            is_profile: false,
        };
    }

    let url_kind = profile_url_kind(url);
    let evidence = DomEvidence::collect(dom);
    let is_profile = url_kind.is_some() && evidence.is_sufficient();

    debug!(
        "Classified {}: url_kind={:?}, evidence={:?}, profile={}",
        url, url_kind, evidence, is_profile
    );

    Classification {
        excluded: false,
        url_kind,
        evidence,
        is_profile,
    }
}

/// Boolean form of [`classify`]
pub fn is_profile_page(url: &str, dom: &DomSnapshot) -> bool {
    classify(url, dom).is_profile
}

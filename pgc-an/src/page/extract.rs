//! Profile snapshot extraction
//!
//! Runs the name, declared-gender and picture strategy chains once per run.
//! The resulting [`ProfileSnapshot`] is immutable; re-extraction builds a new one.

use super::selectors::{NAME_CANDIDATES, PICTURE_CANDIDATES};
use super::strategy::StrategyChain;
use super::DomSnapshot;
use crate::signals::extract_declared;
use pgc_common::Gender;
use serde::Serialize;
use tracing::debug;

/// Width requested for the profile picture
pub const HIGH_RES_WIDTH: u32 = 500;

/// Data extracted from one page for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    name: Option<String>,
    declared_gender: Option<Gender>,
    profile_picture_url: Option<String>,
}

impl ProfileSnapshot {
    pub fn new(
        name: Option<String>,
        declared_gender: Option<Gender>,
        profile_picture_url: Option<String>,
    ) -> Self {
        Self {
            name,
            declared_gender,
            profile_picture_url,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn declared_gender(&self) -> Option<Gender> {
        self.declared_gender
    }

    pub fn profile_picture_url(&self) -> Option<&str> {
        self.profile_picture_url.as_deref()
    }
}

/// Extract name, declared gender and picture URL from a DOM snapshot
pub fn extract_snapshot(dom: &DomSnapshot) -> ProfileSnapshot {
    let name = StrategyChain::text("profile name", NAME_CANDIDATES).first_value(dom);
    let declared_gender = extract_declared(dom);
    let picture = StrategyChain::attribute("profile picture", PICTURE_CANDIDATES, "src")
        .first_value(dom)
        .map(|src| upgrade_picture_resolution(&src));

    debug!(
        "Extracted profile: name={:?}, declared={:?}, picture={}",
        name,
        declared_gender,
        picture.is_some()
    );

    ProfileSnapshot::new(name, declared_gender, picture)
}

/// Rewrite the first `&width=<digits>` to request the high-resolution image
pub fn upgrade_picture_resolution(url: &str) -> String {
    const MARKER: &str = "&width=";

    for (start, _) in url.match_indices(MARKER) {
        let digits_start = start + MARKER.len();
        let digits_len = url[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();

        if digits_len > 0 {
            return format!(
                "{}{}{}",
                &url[..digits_start],
                HIGH_RES_WIDTH,
                &url[digits_start + digits_len..]
            );
        }
    }

    url.to_string()
}

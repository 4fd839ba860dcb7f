//! Selector lists for the supported social network's profile markup
//!
//! Each list is ordered by priority. The markup is not under our control and
//! changes without notice, so every list tolerates missing elements.

/// Profile picture element (classifier evidence)
pub const PROFILE_PICTURE_EVIDENCE: &[&str] = &[
    r#"img[data-imgperflogname="profilePicture"]"#,
    r#"img[data-imgperflogname="profileCoverPhoto"]"#,
];

/// Profile name heading (classifier evidence)
pub const PROFILE_NAME_EVIDENCE: &[&str] = &[
    r#"h1[data-testid="user-name"]"#,
    r#"h1[dir="auto"]"#,
];

/// Profile structure containers; sufficient evidence on their own
pub const PROFILE_STRUCTURE_EVIDENCE: &[&str] = &[
    r#"[data-pagelet="ProfileTilesFeed"]"#,
    r#"[data-pagelet="ProfileTimeline"]"#,
];

/// Display name candidates
pub const NAME_CANDIDATES: &[&str] = &[
    r#"h1[data-testid="user-name"]"#,
    r#"h1[dir="auto"]"#,
    r#"span[dir="auto"]"#,
    r#"[data-pagelet="ProfileTilesFeed"] h1"#,
    r#"div[role="main"] h1"#,
];

/// "About" containers scanned for declared gender phrases
pub const ABOUT_CANDIDATES: &[&str] = &[
    r#"[data-testid="profile-about-section"]"#,
    r#"[data-pagelet="ProfileTilesFeed"]"#,
    r#"div[role="main"] div[dir="auto"]"#,
];

/// Profile picture image candidates; the element must carry a `src`
pub const PICTURE_CANDIDATES: &[&str] = &[
    r#"img[data-imgperflogname="profilePicture"]"#,
    r#"img[data-imgperflogname="profileCoverPhoto"]"#,
    r#"img[alt*="profile picture" i]"#,
    r#"a[href*="/photo"] img"#,
    r#"[role="main"] img[src*="scontent"][src*="fbcdn"]"#,
];

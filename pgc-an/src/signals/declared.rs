//! Declared-gender extractor
//!
//! Scans the "about" containers in priority order. The first container whose
//! text contains any gender phrase decides; within a container the male
//! phrase set is checked first.

use super::phrases::detect_gender;
use crate::page::selectors::ABOUT_CANDIDATES;
use crate::page::strategy::{ExtractionStrategy, StrategyChain};
use crate::page::DomSnapshot;
use pgc_common::Gender;

/// Reads the first element matching a selector and looks for gender phrases
pub struct AboutContainer(pub &'static str);

impl ExtractionStrategy<Gender> for AboutContainer {
    fn name(&self) -> &str {
        self.0
    }

    fn extract(&self, dom: &DomSnapshot) -> Option<Gender> {
        dom.first_text(self.0).and_then(|text| detect_gender(&text))
    }
}

/// Declared-gender chain over the standard "about" containers
pub fn declared_chain() -> StrategyChain<Gender> {
    ABOUT_CANDIDATES
        .iter()
        .fold(StrategyChain::new("declared gender"), |chain, selector| {
            chain.with(AboutContainer(*selector))
        })
}

/// Explicitly stated gender, if any container declares one
pub fn extract_declared(dom: &DomSnapshot) -> Option<Gender> {
    declared_chain().first_value(dom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn about(text: &str) -> DomSnapshot {
        DomSnapshot::parse(&format!(
            r#"<div data-testid="profile-about-section">{}</div>"#,
            text
        ))
    }

    #[test]
    fn test_he_him_and_woman_yields_male() {
        let dom = about("Pronouns he/him · Mentor at Woman in Tech");
        assert_eq!(extract_declared(&dom), Some(Gender::Male));
    }

    #[test]
    fn test_female_declared() {
        let dom = about("Basic info <span>Female</span>");
        assert_eq!(extract_declared(&dom), Some(Gender::Female));
    }

    #[test]
    fn test_nothing_declared() {
        let dom = about("Lives in Lisbon");
        assert_eq!(extract_declared(&dom), None);
        assert_eq!(extract_declared(&DomSnapshot::parse("<p>male</p>")), None);
    }

    #[test]
    fn test_first_matching_container_wins() {
        let dom = DomSnapshot::parse(
            r#"
            <div data-testid="profile-about-section">Studied at Oxford</div>
            <div data-pagelet="ProfileTilesFeed">she/her</div>
            <div role="main"><div dir="auto">he/him</div></div>
            "#,
        );
        assert_eq!(extract_declared(&dom), Some(Gender::Female));
    }
}

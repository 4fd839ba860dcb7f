//! Page documents and DOM snapshots
//!
//! A [`PageDocument`] is the raw `(url, html)` pair pushed by a page context.
//! It is cheap to clone and `Send`, so it can travel between tasks.
//! A [`DomSnapshot`] is the parsed form used by the classifier and the
//! extractors. Parsed HTML is not `Send`; snapshots are built, queried and
//! dropped inside synchronous code and never held across an `.await`.

pub mod classifier;
pub mod extract;
pub mod selectors;
pub mod status;
pub mod strategy;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use classifier::{classify, Classification};
pub use extract::{extract_snapshot, ProfileSnapshot};

/// Raw page document as received from a page context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    pub url: String,
    pub html: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Parse the HTML into a queryable snapshot
    pub fn snapshot(&self) -> DomSnapshot {
        DomSnapshot::parse(&self.html)
    }
}

/// Parsed, read-only view of a page's DOM
pub struct DomSnapshot {
    html: Html,
}

impl DomSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// First element matching a CSS selector, like `document.querySelector`
    ///
    /// Invalid selectors match nothing.
    pub fn query(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(selector)?;
        self.html.select(&selector).next()
    }

    /// Whether any element matches the selector
    pub fn has_match(&self, selector: &str) -> bool {
        self.query(selector).is_some()
    }

    /// Trimmed text content of the first element matching the selector
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.query(selector).map(|element| element_text(&element))
    }

    /// First non-empty attribute value among all elements matching the selector
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        let selector = parse_selector(selector)?;
        self.html
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .find(|value| !value.trim().is_empty())
            .map(str::to_string)
    }
}

/// Concatenated text content with surrounding whitespace trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Skipping invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

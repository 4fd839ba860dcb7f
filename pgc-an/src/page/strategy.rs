//! Prioritized extraction strategy chains
//!
//! A chain holds independent strategies, each yielding a value or nothing.
//! Strategies are tried in order and the first value short-circuits the rest.

use super::DomSnapshot;
use tracing::debug;

/// One way of pulling a value out of a DOM snapshot
pub trait ExtractionStrategy<T>: Send + Sync {
    /// Identifier reported with a hit (usually the selector)
    fn name(&self) -> &str;

    fn extract(&self, dom: &DomSnapshot) -> Option<T>;
}

/// Value produced by a chain, with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<T> {
    pub value: T,
    pub strategy: String,
}

/// Ordered list of strategies; first success wins
pub struct StrategyChain<T> {
    label: &'static str,
    strategies: Vec<Box<dyn ExtractionStrategy<T>>>,
}

impl<T> StrategyChain<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    pub fn with(mut self, strategy: impl ExtractionStrategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn first_match(&self, dom: &DomSnapshot) -> Option<Hit<T>> {
        self.strategies.iter().find_map(|strategy| {
            strategy.extract(dom).map(|value| {
                debug!("{}: matched via {}", self.label, strategy.name());
                Hit {
                    value,
                    strategy: strategy.name().to_string(),
                }
            })
        })
    }

    pub fn first_value(&self, dom: &DomSnapshot) -> Option<T> {
        self.first_match(dom).map(|hit| hit.value)
    }
}

impl StrategyChain<()> {
    /// Chain of presence checks over a selector list
    pub fn presence(label: &'static str, selectors: &'static [&'static str]) -> Self {
        selectors
            .iter()
            .fold(Self::new(label), |chain, selector| {
                chain.with(SelectorPresence(*selector))
            })
    }

    pub fn any_present(&self, dom: &DomSnapshot) -> bool {
        self.first_match(dom).is_some()
    }
}

impl StrategyChain<String> {
    /// Chain of text lookups over a selector list
    pub fn text(label: &'static str, selectors: &'static [&'static str]) -> Self {
        selectors
            .iter()
            .fold(Self::new(label), |chain, selector| chain.with(SelectorText(*selector)))
    }

    /// Chain of attribute lookups over a selector list
    pub fn attribute(
        label: &'static str,
        selectors: &'static [&'static str],
        attr: &'static str,
    ) -> Self {
        selectors.iter().fold(Self::new(label), |chain, selector| {
            chain.with(SelectorAttr {
                selector: *selector,
                attr,
            })
        })
    }
}

/// Yields `()` when the selector matches anything
pub struct SelectorPresence(pub &'static str);

impl ExtractionStrategy<()> for SelectorPresence {
    fn name(&self) -> &str {
        self.0
    }

    fn extract(&self, dom: &DomSnapshot) -> Option<()> {
        dom.has_match(self.0).then_some(())
    }
}

/// Yields the trimmed text of the first matching element, if non-empty
pub struct SelectorText(pub &'static str);

impl ExtractionStrategy<String> for SelectorText {
    fn name(&self) -> &str {
        self.0
    }

    fn extract(&self, dom: &DomSnapshot) -> Option<String> {
        dom.first_text(self.0).filter(|text| !text.is_empty())
    }
}

/// Yields an attribute from the first matching element that carries it
pub struct SelectorAttr {
    pub selector: &'static str,
    pub attr: &'static str,
}

impl ExtractionStrategy<String> for SelectorAttr {
    fn name(&self) -> &str {
        self.selector
    }

    fn extract(&self, dom: &DomSnapshot) -> Option<String> {
        dom.first_attr(self.selector, self.attr)
    }
}

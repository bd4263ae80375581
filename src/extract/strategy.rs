//! Text extraction strategies.

use scraper::{Html, Selector};

/// One way of locating a text value in a document.
pub trait TextStrategy: Send + Sync {
    /// The value, or `None` when this strategy does not apply.
    fn extract(&self, doc: &Html) -> Option<String>;
}

/// Trimmed text of the first element matching a selector.
#[derive(Debug, Clone)]
pub struct SelectorText {
    selector: Selector,
}

impl SelectorText {
    pub fn new(selector: Selector) -> Self {
        Self { selector }
    }
}

impl TextStrategy for SelectorText {
    fn extract(&self, doc: &Html) -> Option<String> {
        let element = doc.select(&self.selector).next()?;
        let text = element.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Strategies tried in order; the first value found wins.
#[derive(Default)]
pub struct FallbackChain {
    strategies: Vec<Box<dyn TextStrategy>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl TextStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn extract(&self, doc: &Html) -> Option<String> {
        self.strategies.iter().find_map(|s| s.extract(doc))
    }
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

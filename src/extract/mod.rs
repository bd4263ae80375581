//! Field extraction from product detail pages.
//!
//! Each field is extracted independently. A field whose markup is missing
//! comes back empty instead of failing the whole record, because the detail
//! markup differs between regular listings, deals and retired products.

mod strategy;

pub use strategy::{FallbackChain, SelectorText, TextStrategy};

use scraper::{Html, Selector};
use tracing::warn;

use crate::config::{parse_selector, SiteConfig};
use crate::error::{ConfigError, ExtractError};
use crate::models::ProductRecord;

/// Extracts title, price and category path from a detail document.
#[derive(Debug)]
pub struct FieldExtractor {
    title: SelectorText,
    price: FallbackChain,
    breadcrumbs: Selector,
    breadcrumb_link: Selector,
}

impl FieldExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        let mut price = FallbackChain::new();
        for css in &site.price_selectors {
            price = price.then(SelectorText::new(parse_selector("price_selectors", css)?));
        }

        Ok(Self {
            title: SelectorText::new(parse_selector("title_selector", &site.title_selector)?),
            price,
            breadcrumbs: parse_selector(
                "breadcrumb_container_selector",
                &site.breadcrumb_container_selector,
            )?,
            breadcrumb_link: parse_selector(
                "breadcrumb_link_selector",
                &site.breadcrumb_link_selector,
            )?,
        })
    }

    /// Product title, or empty when the title element is missing.
    pub fn extract_title(&self, doc: &Html) -> String {
        self.title.extract(doc).unwrap_or_default()
    }

    /// Displayed price, from the first price location that has one.
    pub fn extract_price(&self, doc: &Html) -> String {
        self.price.extract(doc).unwrap_or_default()
    }

    /// Breadcrumb category names in document order.
    pub fn extract_categories(&self, doc: &Html, title: &str) -> Vec<String> {
        let Some(container) = doc.select(&self.breadcrumbs).next() else {
            warn!("Couldn't find categories for {}", title);
            return Vec::new();
        };

        let categories: Vec<String> = container
            .select(&self.breadcrumb_link)
            .map(|a| a.text().collect::<String>().trim().to_string())
            .collect();

        if categories.is_empty() {
            warn!("Couldn't find categories for {}", title);
        }
        categories
    }

    /// Parse a detail page and extract a full record.
    ///
    /// `label` names the product in diagnostics. Only a blank document is an
    /// error; missing fields are left empty.
    pub fn extract_record(&self, html: &str, label: &str) -> Result<ProductRecord, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let doc = Html::parse_document(html);
        Ok(ProductRecord {
            title: self.extract_title(&doc),
            price_text: self.extract_price(&doc),
            categories: self.extract_categories(&doc, label),
        })
    }
}

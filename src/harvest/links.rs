//! Candidate link extraction from listing documents.

use scraper::{Html, Selector};

use crate::config::{parse_selector, SiteConfig};
use crate::error::ConfigError;
use crate::models::CandidateLink;

/// Extracts product anchors from order listing pages.
#[derive(Debug, Clone)]
pub struct LinkHarvester {
    origin: String,
    link: Selector,
    listing_link: Selector,
    listing_container: Option<(String, Selector)>,
}

impl LinkHarvester {
    pub fn new(site: &SiteConfig) -> Result<Self, ConfigError> {
        let listing_container = match site.listing_container_selector.as_deref() {
            Some(css) if !css.trim().is_empty() => Some((
                css.to_string(),
                parse_selector("listing_container_selector", css)?,
            )),
            _ => None,
        };

        Ok(Self {
            origin: site.origin()?,
            link: parse_selector("link_selector", &site.link_selector)?,
            listing_link: parse_selector("listing_link_selector", &site.listing_link_selector)?,
            listing_container,
        })
    }

    /// Every product link in `html`, in document order, duplicates kept.
    ///
    /// Works on full listing pages as well as on the stored fragment file.
    pub fn extract_links(&self, html: &str) -> Vec<CandidateLink> {
        let document = Html::parse_document(html);
        document
            .select(&self.link)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let text = anchor.text().collect::<String>();
                Some(CandidateLink::new(
                    self.absolutize(href),
                    text.trim().to_string(),
                ))
            })
            .collect()
    }

    /// Raw outer HTML of each product anchor inside the order rows of a
    /// listing page, one fragment per anchor.
    pub fn listing_fragments(&self, page_html: &str) -> Vec<String> {
        let document = Html::parse_document(page_html);
        document
            .select(&self.listing_link)
            .map(|anchor| anchor.html())
            .collect()
    }

    /// Whether the configured listing container is present. Always true when
    /// no container selector is configured.
    pub fn has_listing(&self, page_html: &str) -> bool {
        match &self.listing_container {
            Some((_, selector)) => Html::parse_document(page_html)
                .select(selector)
                .next()
                .is_some(),
            None => true,
        }
    }

    pub(crate) fn listing_container_selector(&self) -> Option<&str> {
        self.listing_container.as_ref().map(|(css, _)| css.as_str())
    }

    /// Prefix the site origin unless `href` already starts with it.
    pub fn absolutize(&self, href: &str) -> String {
        if href.starts_with(&self.origin) {
            href.to_string()
        } else {
            format!("{}{}", self.origin, href)
        }
    }
}

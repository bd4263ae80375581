//! Candidate links harvested from the order listing.

use serde::{Deserialize, Serialize};

/// A raw product reference taken from a listing page.
///
/// Not yet verified to point at a product page. Duplicates are expected when
/// the same product was ordered more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Link target, prefixed with the site origin when it was relative.
    pub absolute_url: String,
    /// Visible anchor text (may be empty).
    pub display_text: String,
}

impl CandidateLink {
    pub fn new(absolute_url: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            absolute_url: absolute_url.into(),
            display_text: display_text.into(),
        }
    }

    /// Name used in diagnostics: the anchor text, or the URL when there is none.
    pub fn label(&self) -> &str {
        if self.display_text.is_empty() {
            &self.absolute_url
        } else {
            &self.display_text
        }
    }
}

//! Product records and the cleaned product table.

use serde::{Deserialize, Serialize};

/// Fields extracted from one product detail page.
///
/// Every field may be empty: extraction failures are local to the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// Price as displayed, currency symbol included.
    pub price_text: String,
    /// Breadcrumb path from the most general category down.
    pub categories: Vec<String>,
}

impl ProductRecord {
    pub fn new(
        title: impl Into<String>,
        price_text: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price_text: price_text.into(),
            categories,
        }
    }
}

/// One row of the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    /// Never empty.
    pub title: String,
    /// Always finite.
    pub price: f64,
    pub categories: Vec<String>,
}

/// Cleaned collection of products ready for export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductTable {
    rows: Vec<ProductRow>,
}

impl ProductTable {
    pub(crate) fn from_rows(rows: Vec<ProductRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ProductRow] {
        &self.rows
    }

    /// Sum of all prices in the table.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.price).sum()
    }
}

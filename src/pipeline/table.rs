//! Cleaning raw records into the product table, and CSV export.

use std::io::Write;
use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::ExportError;
use crate::models::{ProductRecord, ProductRow, ProductTable};

/// Parse displayed price text into a number.
///
/// Strips every occurrence of `currency_symbol` and surrounding whitespace.
/// Unparseable and non-finite values are `None`.
pub fn parse_price(text: &str, currency_symbol: &str) -> Option<f64> {
    let stripped = if currency_symbol.is_empty() {
        text.to_string()
    } else {
        text.replace(currency_symbol, "")
    };

    stripped
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// Build the cleaned table.
///
/// Rows without a title are dropped first, then rows whose price does not
/// parse. Pure: the same records always give the same table.
pub fn assemble(records: &[ProductRecord], currency_symbol: &str) -> ProductTable {
    let titled: Vec<&ProductRecord> = records.iter().filter(|r| !r.title.is_empty()).collect();
    let missing_title = records.len() - titled.len();

    let rows: Vec<ProductRow> = titled
        .into_iter()
        .filter_map(|record| {
            let price = parse_price(&record.price_text, currency_symbol)?;
            Some(ProductRow {
                title: record.title.clone(),
                price,
                categories: record.categories.clone(),
            })
        })
        .collect();
    let missing_price = records.len() - missing_title - rows.len();

    if missing_title > 0 || missing_price > 0 {
        info!(
            "Dropped {} rows without a title and {} without a price",
            missing_title, missing_price
        );
    }

    ProductTable::from_rows(rows)
}

/// Write the table as CSV: `title,price,categories`, price as a plain
/// decimal at full precision, categories as a JSON array.
pub fn write_csv<W: Write>(table: &ProductTable, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["title", "price", "categories"])?;

    for row in table.rows() {
        let price = row.price.to_string();
        let categories = serde_json::to_string(&row.categories)?;
        csv.write_record([row.title.as_str(), price.as_str(), categories.as_str()])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the table to `path`, creating parent directories.
pub async fn export_csv(table: &ProductTable, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    fs::write(path, buf).await?;
    info!("Wrote {} products to {:?}", table.len(), path);
    Ok(())
}

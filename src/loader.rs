//! CSV sales loader.
//!
//! Expected columns (trimmed, any order):
//!   date, store_id, product, category, quantity_sold, quantity_wasted, stock, price
//! `sales`/`waste` and capitalized headers are accepted as aliases; a missing
//! `store_id` defaults to store 1.

use crate::error::Result;
use crate::records::{sort_chronologically, SalesRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

fn default_store() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(default = "default_store", alias = "Store")]
    store_id: u32,
    #[serde(default, alias = "Product")]
    product: Option<String>,
    #[serde(default, alias = "Category")]
    category: Option<String>,
    #[serde(alias = "sales", alias = "Sales")]
    quantity_sold: f64,
    #[serde(default, alias = "waste", alias = "Waste")]
    quantity_wasted: Option<f64>,
    #[serde(default, alias = "Stock")]
    stock: Option<f64>,
    #[serde(default, alias = "Price")]
    price: Option<f64>,
}

impl From<CsvRow> for SalesRecord {
    fn from(row: CsvRow) -> Self {
        SalesRecord {
            date: row.date,
            store_id: row.store_id,
            product: row.product.filter(|p| !p.is_empty()),
            category: row.category.filter(|c| !c.is_empty()),
            quantity_sold: row.quantity_sold,
            quantity_wasted: row.quantity_wasted,
            stock: row.stock,
            price: row.price,
        }
    }
}

/// Parse and validate every row; the first bad row aborts the load. Rows come back in
/// series order (store, product, date) whatever order the file lists them in.
pub fn load_sales<R: Read>(reader: R) -> Result<Vec<SalesRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<CsvRow>() {
        let record = SalesRecord::from(row?);
        record.validate()?;
        records.push(record);
    }
    sort_chronologically(&mut records);
    tracing::debug!(count = records.len(), "parsed sales csv");
    Ok(records)
}

pub fn load_sales_file(path: &Path) -> Result<Vec<SalesRecord>> {
    let file = std::fs::File::open(path)?;
    load_sales(file)
}

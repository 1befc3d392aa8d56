//! Sales records: the unit of ingestion, keyed by (date, store, product).
//! Series grouping and input validation live here so every consumer rejects the same rows.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One day of sales for a store (and optionally a product). Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub store_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity_sold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_wasted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Unique identity of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub date: NaiveDate,
    pub store_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.product {
            Some(p) => write!(f, "{}/store-{}/{}", self.date, self.store_id, p),
            None => write!(f, "{}/store-{}", self.date, self.store_id),
        }
    }
}

/// A time series is every record sharing store and product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub store_id: u32,
    pub product: Option<String>,
}

impl SalesRecord {
    pub fn new(date: NaiveDate, store_id: u32, quantity_sold: f64) -> Self {
        Self {
            date,
            store_id,
            product: None,
            category: None,
            quantity_sold,
            quantity_wasted: None,
            stock: None,
            price: None,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>, category: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self.category = Some(category.into());
        self
    }

    pub fn with_waste(mut self, wasted: f64) -> Self {
        self.quantity_wasted = Some(wasted);
        self
    }

    pub fn with_stock(mut self, stock: f64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            date: self.date,
            store_id: self.store_id,
            product: self.product.clone(),
        }
    }

    pub fn series(&self) -> SeriesKey {
        SeriesKey {
            store_id: self.store_id,
            product: self.product.clone(),
        }
    }

    pub fn wasted(&self) -> f64 {
        self.quantity_wasted.unwrap_or(0.0)
    }

    /// Quantity that was on the shelf: stock when known, else sold + wasted.
    pub fn available(&self) -> f64 {
        self.stock
            .unwrap_or_else(|| self.quantity_sold + self.wasted())
    }

    /// Wasted share of the available quantity, 0 when nothing was available.
    pub fn waste_ratio(&self) -> f64 {
        let available = self.available();
        if available > 0.0 {
            (self.wasted() / available).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Field-level checks that do not depend on neighbouring records.
    pub fn validate(&self) -> Result<()> {
        let key = self.key();
        check_quantity(&key, "quantity_sold", Some(self.quantity_sold))?;
        check_quantity(&key, "quantity_wasted", self.quantity_wasted)?;
        check_quantity(&key, "stock", self.stock)?;
        check_quantity(&key, "price", self.price)?;
        Ok(())
    }
}

fn check_quantity(key: &RecordKey, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::invalid_record(key, format!("{field} is not finite"))),
        Some(v) if v < 0.0 => Err(Error::invalid_record(key, format!("{field} is negative ({v})"))),
        _ => Ok(()),
    }
}

/// Validate a batch: every record well-formed, and within each series dates strictly increase.
/// Series may be interleaved; only the relative order inside a series matters.
pub fn validate_series<'a>(records: impl IntoIterator<Item = &'a SalesRecord>) -> Result<()> {
    let mut last_seen: HashMap<SeriesKey, NaiveDate> = HashMap::new();
    for record in records {
        record.validate()?;
        let series = record.series();
        if let Some(prev) = last_seen.get(&series) {
            if record.date == *prev {
                return Err(Error::invalid_record(&record.key(), "duplicate date for series"));
            }
            if record.date < *prev {
                return Err(Error::invalid_record(
                    &record.key(),
                    format!("out of order (previous date {prev})"),
                ));
            }
        }
        last_seen.insert(series, record.date);
    }
    Ok(())
}

/// Sort a batch into series order (store, product, date). Stable for equal keys.
pub fn sort_chronologically(records: &mut [SalesRecord]) {
    records.sort_by(|a, b| {
        (a.store_id, &a.product, a.date).cmp(&(b.store_id, &b.product, b.date))
    });
}

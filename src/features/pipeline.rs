//! Feature extraction pipeline: records → per-series rolling windows → calendar encodings and ratios → vector.

use super::{FeatureColumn, FeatureVector, RollingWindow, TemporalFeatures};
use crate::config::FeaturesConfig;
use crate::error::{Error, Result};
use crate::records::{validate_series, SalesRecord, SeriesKey};
use std::collections::HashMap;

/// Guards the z-score against a zero-spread window.
const STD_EPSILON: f64 = 1e-6;

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeaturesConfig {
        &self.config
    }

    /// One feature vector per record, in input order.
    pub fn extract(&self, records: &[SalesRecord]) -> Result<Vec<FeatureVector>> {
        self.extract_with_history(&[], records)
    }

    /// Like [`FeatureExtractor::extract`], but `history` warms the rolling windows first.
    /// History must precede `records` within each series; it yields no vectors itself.
    pub fn extract_with_history(
        &self,
        history: &[SalesRecord],
        records: &[SalesRecord],
    ) -> Result<Vec<FeatureVector>> {
        validate_series(history.iter().chain(records.iter()))?;

        let window_size = self.config.window;
        let mut windows: HashMap<SeriesKey, SeriesWindows> = HashMap::new();
        for r in history {
            windows
                .entry(r.series())
                .or_insert_with(|| SeriesWindows::new(window_size))
                .push(r);
        }

        let mut out = Vec::with_capacity(records.len());
        for r in records {
            let series = windows
                .entry(r.series())
                .or_insert_with(|| SeriesWindows::new(window_size));
            series.push(r);
            if self.config.require_full_window && !series.sales.is_full() {
                return Err(Error::InsufficientData {
                    required: series.sales.size(),
                    actual: series.sales.len(),
                });
            }
            out.push(build_vector(r, series));
        }

        tracing::debug!(
            records = records.len(),
            history = history.len(),
            series = windows.len(),
            "features extracted"
        );
        Ok(out)
    }
}

/// Trailing sales and waste-ratio windows of one store/product series.
struct SeriesWindows {
    sales: RollingWindow,
    waste: RollingWindow,
}

impl SeriesWindows {
    fn new(size: usize) -> Self {
        Self {
            sales: RollingWindow::new(size),
            waste: RollingWindow::new(size),
        }
    }

    fn push(&mut self, record: &SalesRecord) {
        self.sales.push(record.quantity_sold);
        self.waste.push(record.waste_ratio());
    }
}

fn sales_stock_ratio(record: &SalesRecord) -> f64 {
    match record.stock {
        Some(stock) if stock > 0.0 => record.quantity_sold / stock,
        _ => 0.0,
    }
}

fn build_vector(record: &SalesRecord, series: &SeriesWindows) -> FeatureVector {
    let stats = series.sales.stats();
    let temporal = TemporalFeatures::from_date(record.date);
    let deviation = (record.quantity_sold - stats.mean) / (stats.std + STD_EPSILON);

    let mut values = vec![0.0; FeatureColumn::COUNT];
    values[FeatureColumn::QuantitySold.index()] = record.quantity_sold;
    values[FeatureColumn::DowSin.index()] = temporal.dow_sin;
    values[FeatureColumn::DowCos.index()] = temporal.dow_cos;
    values[FeatureColumn::DoySin.index()] = temporal.doy_sin;
    values[FeatureColumn::DoyCos.index()] = temporal.doy_cos;
    values[FeatureColumn::RollingMean.index()] = stats.mean;
    values[FeatureColumn::RollingStd.index()] = stats.std;
    values[FeatureColumn::Deviation.index()] = deviation;
    values[FeatureColumn::WindowFill.index()] = stats.len as f64 / series.sales.size() as f64;
    values[FeatureColumn::WasteRatio.index()] = record.waste_ratio();
    values[FeatureColumn::SalesStockRatio.index()] = sales_stock_ratio(record);
    values[FeatureColumn::RollingWasteMean.index()] = series.waste.stats().mean;

    FeatureVector {
        record_key: record.key(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(d as i64)
    }

    fn extractor(window: usize) -> FeatureExtractor {
        FeatureExtractor::new(FeaturesConfig {
            window,
            require_full_window: false,
        })
    }

    #[test]
    fn one_vector_per_record_in_order() {
        let rows: Vec<_> = (0..10).map(|d| SalesRecord::new(day(d), 1, d as f64)).collect();
        let out = extractor(3).extract(&rows).unwrap();
        assert_eq!(out.len(), rows.len());
        for (r, v) in rows.iter().zip(&out) {
            assert_eq!(r.key(), v.record_key);
            assert_eq!(v.values.len(), FeatureColumn::COUNT);
        }
    }

    #[test]
    fn windows_do_not_cross_stores() {
        let rows = vec![
            SalesRecord::new(day(0), 1, 10.0),
            SalesRecord::new(day(0), 2, 1000.0),
            SalesRecord::new(day(1), 1, 20.0),
        ];
        let out = extractor(7).extract(&rows).unwrap();
        assert_eq!(out[2].get(FeatureColumn::RollingMean), 15.0);
        assert_eq!(out[1].get(FeatureColumn::RollingMean), 1000.0);
    }

    #[test]
    fn windows_do_not_cross_products() {
        let rows = vec![
            SalesRecord::new(day(0), 1, 10.0).with_product("Milk", "Dairy"),
            SalesRecord::new(day(0), 1, 500.0).with_product("Bread", "Bakery"),
            SalesRecord::new(day(1), 1, 30.0).with_product("Milk", "Dairy"),
        ];
        let out = extractor(7).extract(&rows).unwrap();
        assert_eq!(out[2].get(FeatureColumn::RollingMean), 20.0);
    }

    #[test]
    fn warm_up_rows_report_partial_fill() {
        let rows: Vec<_> = (0..5).map(|d| SalesRecord::new(day(d), 1, 5.0)).collect();
        let out = extractor(4).extract(&rows).unwrap();
        assert_eq!(out[0].get(FeatureColumn::WindowFill), 0.25);
        assert_eq!(out[3].get(FeatureColumn::WindowFill), 1.0);
        assert_eq!(out[4].get(FeatureColumn::WindowFill), 1.0);
    }

    #[test]
    fn strict_mode_requires_full_window() {
        let ex = FeatureExtractor::new(FeaturesConfig {
            window: 3,
            require_full_window: true,
        });
        let rows: Vec<_> = (0..5).map(|d| SalesRecord::new(day(d), 1, 5.0)).collect();
        let err = ex.extract(&rows).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { required: 3, actual: 1 }));

        let out = ex.extract_with_history(&rows[..2], &rows[2..]).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn history_warms_the_window() {
        let rows: Vec<_> = (0..4).map(|d| SalesRecord::new(day(d), 1, (d * 10) as f64)).collect();
        let full = extractor(3).extract(&rows).unwrap();
        let split = extractor(3).extract_with_history(&rows[..2], &rows[2..]).unwrap();
        assert_eq!(full[2..], split[..]);
    }

    #[test]
    fn history_after_records_is_rejected() {
        let rows = vec![SalesRecord::new(day(5), 1, 1.0)];
        let history = vec![SalesRecord::new(day(6), 1, 1.0)];
        assert!(extractor(3).extract_with_history(&history, &rows).is_err());
    }

    #[test]
    fn waste_and_stock_columns_are_causal_per_series() {
        let rows = vec![
            SalesRecord::new(day(0), 1, 80.0).with_waste(20.0).with_stock(100.0),
            SalesRecord::new(day(0), 2, 10.0).with_waste(90.0).with_stock(100.0),
            SalesRecord::new(day(1), 1, 90.0).with_waste(10.0).with_stock(100.0),
            SalesRecord::new(day(2), 1, 50.0),
        ];
        let out = extractor(7).extract(&rows).unwrap();
        assert!((out[0].get(FeatureColumn::WasteRatio) - 0.2).abs() < 1e-12);
        assert!((out[0].get(FeatureColumn::SalesStockRatio) - 0.8).abs() < 1e-12);
        // Store 2's heavy waste stays out of store 1's window.
        assert!((out[2].get(FeatureColumn::RollingWasteMean) - 0.15).abs() < 1e-12);
        // No waste or stock recorded: ratios are 0.
        assert_eq!(out[3].get(FeatureColumn::WasteRatio), 0.0);
        assert_eq!(out[3].get(FeatureColumn::SalesStockRatio), 0.0);
        assert!((out[3].get(FeatureColumn::RollingWasteMean) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn spike_has_large_deviation() {
        let mut rows: Vec<_> = (0..6).map(|d| SalesRecord::new(day(d), 1, 10.0 + (d % 2) as f64)).collect();
        rows.push(SalesRecord::new(day(6), 1, 105.0));
        let out = extractor(7).extract(&rows).unwrap();
        assert!(out[6].get(FeatureColumn::Deviation) > 2.0);
        assert!(out[5].get(FeatureColumn::Deviation).abs() < 2.0);
    }
}

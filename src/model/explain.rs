//! Human-readable reasons attached to a flagged record.

use super::AnomalyResult;
use crate::features::{FeatureColumn, FeatureVector};
use crate::records::SalesRecord;
use serde::{Deserialize, Serialize};

const DEVIATION_LIMIT: f64 = 2.0;
const HIGH_WASTE_RATIO: f64 = 0.30;
const LOW_SELL_THROUGH: f64 = 0.3;

/// A scored record together with the reasons it stands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    #[serde(flatten)]
    pub result: AnomalyResult,
    pub explanation: String,
}

pub fn explain(record: &SalesRecord, vector: &FeatureVector) -> String {
    let mut reasons = Vec::new();

    let deviation = vector.get(FeatureColumn::Deviation);
    if deviation.abs() > DEVIATION_LIMIT {
        let direction = if deviation > 0.0 { "higher" } else { "lower" };
        reasons.push(format!(
            "sales {:.1} std dev {} than normal",
            deviation.abs(),
            direction
        ));
    }

    let waste = record.waste_ratio();
    if waste > HIGH_WASTE_RATIO {
        reasons.push(format!("high waste: {:.1}%", waste * 100.0));
    }

    if let Some(stock) = record.stock.filter(|s| *s > 0.0) {
        if record.quantity_sold / stock < LOW_SELL_THROUGH {
            reasons.push("overstocked (low sales-to-stock ratio)".to_string());
        }
    }

    if reasons.is_empty() {
        reasons.push("unusual combination of factors".to_string());
    }
    reasons.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vector_with_deviation(record: &SalesRecord, deviation: f64) -> FeatureVector {
        let mut values = vec![0.0; FeatureColumn::COUNT];
        values[FeatureColumn::Deviation.index()] = deviation;
        FeatureVector {
            record_key: record.key(),
            values,
        }
    }

    #[test]
    fn spike_and_waste_both_reported() {
        let r = SalesRecord::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1, 10.0)
            .with_waste(40.0)
            .with_stock(100.0);
        let text = explain(&r, &vector_with_deviation(&r, -3.25));
        assert!(text.contains("3.2 std dev lower") || text.contains("3.3 std dev lower"));
        assert!(text.contains("high waste: 40.0%"));
        assert!(text.contains("overstocked"));
    }

    #[test]
    fn falls_back_to_generic_reason() {
        let r = SalesRecord::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1, 10.0);
        assert_eq!(explain(&r, &vector_with_deviation(&r, 0.5)), "unusual combination of factors");
    }
}

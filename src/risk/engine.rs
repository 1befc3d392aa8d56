//! Waste risk scoring: applies the rule table to current and historical waste and maps
//! the 0-100 score onto a recommendation tier via configurable breakpoints.

use super::{RiskBreakpoints, WasteHistory, WasteRiskInput};
use crate::config::RiskConfig;
use crate::error::Result;
use crate::records::{validate_series, RecordKey, SalesRecord, SeriesKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Perishable items above this current waste ratio also get a quality check.
const INSPECTION_WASTE_RATIO: f64 = 0.10;
const INSPECTION_PERISHABILITY: f64 = 0.8;
/// Stock at twice the trailing sales scores 50.
const STOCK_COVERAGE_SCALE: f64 = 50.0;
/// Sales falling by half scores 100.
const SALES_TREND_SCALE: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    None,
    Monitor,
    Markdown,
    Urgent,
}

impl Recommendation {
    pub fn from_score(score: u8, breakpoints: &RiskBreakpoints) -> Self {
        if score >= breakpoints.urgent {
            Recommendation::Urgent
        } else if score >= breakpoints.markdown {
            Recommendation::Markdown
        } else if score >= breakpoints.monitor {
            Recommendation::Monitor
        } else {
            Recommendation::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::None => "none",
            Recommendation::Monitor => "monitor",
            Recommendation::Markdown => "markdown",
            Recommendation::Urgent => "urgent",
        }
    }
}

/// Risk result for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRiskResult {
    pub record_key: RecordKey,
    pub risk_score: u8,
    pub recommendation: Recommendation,
    pub actions: Vec<String>,
}

pub struct WasteRiskScorer {
    config: RiskConfig,
}

impl WasteRiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// 0-100 score from the rule table. Pure.
    pub fn risk_score(&self, input: &WasteRiskInput) -> u8 {
        let rules = &self.config.rules;
        let current = (input.current_ratio() * 100.0).clamp(0.0, 100.0);
        let historical = (input.historical_waste_ratio * 100.0).clamp(0.0, 100.0);
        let trend = (input.historical_waste_trend * rules.trend_scale).clamp(0.0, 100.0);
        let pressure = (current / 100.0 + trend / 100.0).min(1.0);
        let bonus = input.perishability_weight.clamp(0.0, 1.0) * rules.perishability_bonus * pressure;
        let stock = input
            .stock_coverage
            .map_or(0.0, |c| ((c - 1.0) * STOCK_COVERAGE_SCALE).clamp(0.0, 100.0));
        let falling_sales = (-input.sales_trend * SALES_TREND_SCALE).clamp(0.0, 100.0);

        let raw = rules.current_weight * current
            + rules.historical_weight * historical
            + rules.trend_weight * trend
            + rules.stock_weight * stock
            + rules.sales_trend_weight * falling_sales
            + bonus;
        if raw.is_nan() {
            return 0;
        }
        raw.clamp(0.0, 100.0).round() as u8
    }

    pub fn score(&self, record_key: RecordKey, input: &WasteRiskInput) -> WasteRiskResult {
        let risk_score = self.risk_score(input);
        let recommendation = Recommendation::from_score(risk_score, &self.config.breakpoints);
        WasteRiskResult {
            record_key,
            risk_score,
            recommendation,
            actions: actions(recommendation, input),
        }
    }

    /// Score every record against the waste history of its own series, in input order.
    pub fn score_records(&self, records: &[SalesRecord], window: usize) -> Result<Vec<WasteRiskResult>> {
        validate_series(records)?;
        let mut histories: HashMap<SeriesKey, WasteHistory> = HashMap::new();
        let mut out = Vec::with_capacity(records.len());
        for r in records {
            let history = histories
                .entry(r.series())
                .or_insert_with(|| WasteHistory::new(window));
            let input = WasteRiskInput::from_record(r, history, &self.config.perishability);
            out.push(self.score(r.key(), &input));
            history.observe(r);
        }
        Ok(out)
    }
}

fn actions(recommendation: Recommendation, input: &WasteRiskInput) -> Vec<String> {
    let mut out: Vec<String> = match recommendation {
        Recommendation::Urgent => vec![
            "markdown 30% immediately".into(),
            "halve next supplier order".into(),
        ],
        Recommendation::Markdown => vec!["apply 15% discount".into(), "reduce order quantity".into()],
        Recommendation::Monitor | Recommendation::None => Vec::new(),
    };
    if input.perishability_weight >= INSPECTION_PERISHABILITY && input.current_ratio() > INSPECTION_WASTE_RATIO {
        out.push("inspect quality / check expiration".into());
    }
    if out.is_empty() {
        out.push("monitor standard levels".into());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key() -> RecordKey {
        RecordKey {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            store_id: 1,
            product: Some("Milk".into()),
        }
    }

    fn input(wasted: f64, available: f64, hist: f64, trend: f64, perish: f64) -> WasteRiskInput {
        WasteRiskInput {
            current_waste_quantity: wasted,
            quantity_available: available,
            historical_waste_ratio: hist,
            historical_waste_trend: trend,
            perishability_weight: perish,
            ..WasteRiskInput::default()
        }
    }

    #[test]
    fn no_waste_flat_trend_is_none() {
        let s = WasteRiskScorer::new(RiskConfig::default());
        let r = s.score(key(), &input(0.0, 100.0, 0.0, 0.0, 1.0));
        assert_eq!(r.risk_score, 0);
        assert_eq!(r.recommendation, Recommendation::None);
        assert_eq!(r.actions, vec!["monitor standard levels".to_string()]);
    }

    #[test]
    fn heavy_waste_on_perishable_is_urgent() {
        let s = WasteRiskScorer::new(RiskConfig::default());
        // current 90 * 0.6 = 54, hist 60 * 0.2 = 12, trend 0.25*200=50 * 0.2 = 10, bonus 15
        let r = s.score(key(), &input(90.0, 100.0, 0.6, 0.25, 1.0));
        assert_eq!(r.risk_score, 91);
        assert_eq!(r.recommendation, Recommendation::Urgent);
        assert!(r.actions.iter().any(|a| a.contains("markdown 30%")));
        assert!(r.actions.iter().any(|a| a.contains("inspect quality")));
    }

    #[test]
    fn improving_trend_adds_nothing() {
        let s = WasteRiskScorer::new(RiskConfig::default());
        let worse = s.risk_score(&input(20.0, 100.0, 0.2, 0.0, 0.0));
        let better = s.risk_score(&input(20.0, 100.0, 0.2, -0.3, 0.0));
        assert_eq!(worse, better);
    }

    #[test]
    fn score_is_clamped() {
        let mut config = RiskConfig::default();
        config.rules.current_weight = 5.0;
        let s = WasteRiskScorer::new(config);
        assert_eq!(s.risk_score(&input(100.0, 100.0, 1.0, 1.0, 1.0)), 100);
    }

    #[test]
    fn breakpoints_drive_tiers() {
        let b = RiskBreakpoints::default();
        assert_eq!(Recommendation::from_score(24, &b), Recommendation::None);
        assert_eq!(Recommendation::from_score(25, &b), Recommendation::Monitor);
        assert_eq!(Recommendation::from_score(50, &b), Recommendation::Markdown);
        assert_eq!(Recommendation::from_score(75, &b), Recommendation::Urgent);

        let custom = RiskBreakpoints::new(10, 20, 30).unwrap();
        assert_eq!(Recommendation::from_score(25, &custom), Recommendation::Markdown);
    }

    #[test]
    fn zero_available_does_not_divide_by_zero() {
        let s = WasteRiskScorer::new(RiskConfig::default());
        assert_eq!(s.risk_score(&input(0.0, 0.0, 0.0, 0.0, 1.0)), 0);
    }

    #[test]
    fn records_use_their_own_series_history() {
        let s = WasteRiskScorer::new(RiskConfig::default());
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Duration::days(n);
        let rows = vec![
            SalesRecord::new(d(0), 1, 50.0).with_waste(50.0).with_product("Bread", "Bakery"),
            SalesRecord::new(d(0), 1, 100.0).with_waste(0.0).with_product("Milk", "Dairy"),
            SalesRecord::new(d(1), 1, 100.0).with_waste(0.0).with_product("Milk", "Dairy"),
        ];
        let out = s.score_records(&rows, 7).unwrap();
        assert_eq!(out.len(), 3);
        // Bread's heavy waste must not leak into Milk's history.
        assert_eq!(out[2].risk_score, 0);
        assert!(out[0].risk_score > 0);
    }

    #[test]
    fn overstock_raises_score_when_weighted() {
        let mut config = RiskConfig::default();
        let base = input(10.0, 100.0, 0.1, 0.0, 0.5);
        let overstocked = WasteRiskInput {
            stock_coverage: Some(3.0),
            ..base.clone()
        };
        assert_eq!(
            WasteRiskScorer::new(config.clone()).risk_score(&overstocked),
            WasteRiskScorer::new(config.clone()).risk_score(&base)
        );

        config.rules.stock_weight = 0.2;
        let s = WasteRiskScorer::new(config);
        let matched = WasteRiskInput {
            stock_coverage: Some(1.0),
            ..base.clone()
        };
        assert_eq!(s.risk_score(&matched), s.risk_score(&base));
        // coverage 3 → stock score 100, weighted 20
        assert_eq!(s.risk_score(&overstocked), s.risk_score(&base) + 20);
    }

    #[test]
    fn falling_sales_raise_score_when_weighted() {
        let mut config = RiskConfig::default();
        config.rules.sales_trend_weight = 0.2;
        let s = WasteRiskScorer::new(config);
        let steady = input(10.0, 100.0, 0.1, 0.0, 0.5);
        let falling = WasteRiskInput {
            sales_trend: -0.25,
            ..steady.clone()
        };
        let rising = WasteRiskInput {
            sales_trend: 0.25,
            ..steady.clone()
        };
        assert_eq!(s.risk_score(&falling), s.risk_score(&steady) + 10);
        assert_eq!(s.risk_score(&rising), s.risk_score(&steady));
    }

    #[test]
    fn growing_stock_over_flat_sales_scores_higher() {
        let mut config = RiskConfig::default();
        config.rules.stock_weight = 0.3;
        let s = WasteRiskScorer::new(config);
        let d = |n: i64| NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Duration::days(n);
        let rows: Vec<_> = (0..8)
            .map(|n| SalesRecord::new(d(n), 1, 50.0).with_stock(50.0 + 10.0 * n as f64))
            .collect();
        let out = s.score_records(&rows, 7).unwrap();
        assert_eq!(out[0].risk_score, 0);
        assert!(out[7].risk_score > out[2].risk_score);
    }
}

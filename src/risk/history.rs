//! Causal waste history per series, turned into scorer inputs.

use super::PerishabilityTable;
use crate::records::SalesRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Everything the rule table looks at for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteRiskInput {
    pub current_waste_quantity: f64,
    /// Stock when known, else sold + wasted
    pub quantity_available: f64,
    /// Mean waste ratio over the prior window, in [0, 1]
    pub historical_waste_ratio: f64,
    /// Recent minus older half of the prior window; positive is worsening, 0 is flat
    pub historical_waste_trend: f64,
    pub perishability_weight: f64,
    /// Stock over the trailing mean of prior sales; `None` without stock or sales history
    #[serde(default)]
    pub stock_coverage: Option<f64>,
    /// Relative change of recent vs longer-run prior sales; negative is falling, 0 is flat
    #[serde(default)]
    pub sales_trend: f64,
}

impl WasteRiskInput {
    pub fn from_record(record: &SalesRecord, history: &WasteHistory, table: &PerishabilityTable) -> Self {
        Self {
            current_waste_quantity: record.wasted(),
            quantity_available: record.available(),
            historical_waste_ratio: history.mean_ratio(),
            historical_waste_trend: history.trend(),
            perishability_weight: table.weight_for(record.category.as_deref()),
            stock_coverage: record
                .stock
                .zip(history.sales_mean())
                .filter(|(_, mean)| *mean > 0.0)
                .map(|(stock, mean)| stock / mean),
            sales_trend: history.sales_trend(),
        }
    }

    pub fn current_ratio(&self) -> f64 {
        if self.quantity_available > 0.0 {
            (self.current_waste_quantity / self.quantity_available).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Waste ratios and sales of the records strictly before the current one. Ratios are
/// capped at `window`; sales keep twice that for the short-vs-long sales trend.
#[derive(Debug, Clone)]
pub struct WasteHistory {
    window: usize,
    ratios: VecDeque<f64>,
    sales: VecDeque<f64>,
}

impl WasteHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            ratios: VecDeque::new(),
            sales: VecDeque::new(),
        }
    }

    /// Append a finished record's waste ratio and sales.
    pub fn observe(&mut self, record: &SalesRecord) {
        self.push(record.waste_ratio());
        self.sales.push_back(record.quantity_sold);
        while self.sales.len() > 2 * self.window {
            self.sales.pop_front();
        }
    }

    pub fn push(&mut self, ratio: f64) {
        self.ratios.push_back(ratio);
        while self.ratios.len() > self.window {
            self.ratios.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    pub fn mean_ratio(&self) -> f64 {
        mean(self.ratios.iter().copied()).unwrap_or(0.0)
    }

    /// Flat (0) until there are at least two observations.
    pub fn trend(&self) -> f64 {
        let n = self.ratios.len();
        if n < 2 {
            return 0.0;
        }
        let half = n / 2;
        let older = mean(self.ratios.iter().take(half).copied()).unwrap_or(0.0);
        let recent = mean(self.ratios.iter().skip(n - half).copied()).unwrap_or(0.0);
        recent - older
    }

    /// Mean of the last `window` sales, `None` before any sales are observed.
    pub fn sales_mean(&self) -> Option<f64> {
        mean(self.sales.iter().rev().take(self.window).copied())
    }

    /// `(short − long) / long` over the last `window` and `2·window` sales. Flat (0)
    /// until more than `window` sales are known.
    pub fn sales_trend(&self) -> f64 {
        if self.sales.len() <= self.window {
            return 0.0;
        }
        match (self.sales_mean(), mean(self.sales.iter().copied())) {
            (Some(short), Some(long)) if long > 0.0 => (short - long) / long,
            _ => 0.0,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

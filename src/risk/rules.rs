//! Declarative scoring policy: component weights, tier breakpoints, perishability weights.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weights combining the component scores (each 0 to 100) into the final risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    pub current_weight: f64,
    pub historical_weight: f64,
    pub trend_weight: f64,
    /// Points per unit of waste-ratio increase (0.5 → 100 at the default)
    pub trend_scale: f64,
    /// Bonus points for a fully perishable item under full waste pressure
    pub perishability_bonus: f64,
    /// Weight of the overstock score, `(stock / mean sales − 1)·50`; 0 leaves it out
    pub stock_weight: f64,
    /// Weight of the falling-sales score, `−relative sales trend·200`; 0 leaves it out
    pub sales_trend_weight: f64,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            current_weight: 0.6,
            historical_weight: 0.2,
            trend_weight: 0.2,
            trend_scale: 200.0,
            perishability_bonus: 15.0,
            stock_weight: 0.0,
            sales_trend_weight: 0.0,
        }
    }
}

impl RiskRules {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("current_weight", self.current_weight),
            ("historical_weight", self.historical_weight),
            ("trend_weight", self.trend_weight),
            ("trend_scale", self.trend_scale),
            ("perishability_bonus", self.perishability_bonus),
            ("stock_weight", self.stock_weight),
            ("sales_trend_weight", self.sales_trend_weight),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "risk.rules.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.perishability_bonus > 100.0 {
            return Err(Error::InvalidConfig(format!(
                "risk.rules.perishability_bonus must be at most 100, got {}",
                self.perishability_bonus
            )));
        }
        Ok(())
    }
}

/// Lower bounds of each tier above `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBreakpoints {
    pub monitor: u8,
    pub markdown: u8,
    pub urgent: u8,
}

impl Default for RiskBreakpoints {
    fn default() -> Self {
        Self {
            monitor: 25,
            markdown: 50,
            urgent: 75,
        }
    }
}

impl RiskBreakpoints {
    pub fn new(monitor: u8, markdown: u8, urgent: u8) -> Result<Self> {
        let b = Self {
            monitor,
            markdown,
            urgent,
        };
        b.validate()?;
        Ok(b)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0 < self.monitor && self.monitor < self.markdown && self.markdown < self.urgent && self.urgent <= 100) {
            return Err(Error::InvalidConfig(format!(
                "risk breakpoints must satisfy 0 < monitor < markdown < urgent <= 100, got {}/{}/{}",
                self.monitor, self.markdown, self.urgent
            )));
        }
        Ok(())
    }
}

/// Per-category multiplier in [0, 1] for how quickly unsold stock becomes waste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerishabilityTable {
    pub default_weight: f64,
    pub categories: BTreeMap<String, f64>,
}

impl Default for PerishabilityTable {
    fn default() -> Self {
        let categories = [
            ("Fresh Produce", 1.0),
            ("Produce", 1.0),
            ("Bakery", 1.0),
            ("Meat", 1.0),
            ("Dairy", 0.8),
            ("Frozen", 0.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            default_weight: 0.5,
            categories,
        }
    }
}

impl PerishabilityTable {
    /// Exact match first, then case-insensitive; unknown or missing category gets the default.
    pub fn weight_for(&self, category: Option<&str>) -> f64 {
        let Some(category) = category else {
            return self.default_weight;
        };
        if let Some(w) = self.categories.get(category) {
            return *w;
        }
        self.categories
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(category))
            .map(|(_, w)| *w)
            .unwrap_or(self.default_weight)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |w: f64| (0.0..=1.0).contains(&w);
        if !in_range(self.default_weight) {
            return Err(Error::InvalidConfig(format!(
                "perishability default_weight must be in [0, 1], got {}",
                self.default_weight
            )));
        }
        if let Some((k, w)) = self.categories.iter().find(|(_, w)| !in_range(**w)) {
            return Err(Error::InvalidConfig(format!(
                "perishability weight for {k} must be in [0, 1], got {w}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_must_ascend() {
        assert!(RiskBreakpoints::new(25, 50, 75).is_ok());
        assert!(RiskBreakpoints::new(50, 25, 75).is_err());
        assert!(RiskBreakpoints::new(0, 25, 75).is_err());
        assert!(RiskBreakpoints::new(25, 50, 101).is_err());
    }

    #[test]
    fn perishability_lookup() {
        let t = PerishabilityTable::default();
        assert_eq!(t.weight_for(Some("Bakery")), 1.0);
        assert_eq!(t.weight_for(Some("frozen")), 0.1);
        assert_eq!(t.weight_for(Some("Hardware")), 0.5);
        assert_eq!(t.weight_for(None), 0.5);
    }

    #[test]
    fn perishability_out_of_range() {
        let mut t = PerishabilityTable::default();
        t.categories.insert("Flowers".into(), 1.5);
        assert!(t.validate().is_err());
    }

    #[test]
    fn rules_reject_negative_or_nan_weights() {
        assert!(RiskRules::default().validate().is_ok());
        let mut r = RiskRules::default();
        r.historical_weight = -0.2;
        assert!(matches!(r.validate(), Err(Error::InvalidConfig(_))));
        let mut r = RiskRules::default();
        r.trend_scale = f64::NAN;
        let err = r.validate().unwrap_err();
        assert!(err.to_string().contains("trend_scale"), "{err}");
        let mut r = RiskRules::default();
        r.perishability_bonus = 150.0;
        assert!(r.validate().is_err());
    }
}

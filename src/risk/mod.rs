//! Waste risk scoring: deterministic rule table over waste history and perishability.

mod engine;
mod history;
mod rules;

pub use engine::{Recommendation, WasteRiskResult, WasteRiskScorer};
pub use history::{WasteHistory, WasteRiskInput};
pub use rules::{PerishabilityTable, RiskBreakpoints, RiskRules};

//! Unsupervised anomaly detection: isolation forest, fit/score lifecycle, model slot.

mod detector;
mod explain;
mod isolation_forest;
mod slot;

pub use detector::{AnomalyDetector, AnomalyResult, FittedDetector};
pub use explain::{explain, AnomalyReport};
pub use isolation_forest::{average_path_length, ForestParams, IsolationForest, IsolationTree};
pub use slot::ModelSlot;

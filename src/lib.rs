//! shelfwatch: self-hosted retail demand anomaly detection and waste risk scoring.
//!
//! Modular structure:
//! - [`records`]: Sales record type, keys and input validation
//! - [`features`]: Cyclical calendar encodings and causal rolling statistics
//! - [`model`]: Isolation forest anomaly detection and the current-model slot
//! - [`risk`]: Rule-table waste risk scoring and recommendations
//! - [`storage`]: SQLite persistence of sales and predictions
//! - [`generator`] / [`loader`]: Synthetic data and CSV import
//! - [`pipeline`]: End-to-end orchestration
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod error;
pub mod records;
pub mod features;
pub mod model;
pub mod risk;
pub mod storage;
pub mod generator;
pub mod loader;
pub mod pipeline;
pub mod logging;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use records::{RecordKey, SalesRecord};
pub use features::{FeatureExtractor, FeatureVector};
pub use model::{AnomalyDetector, AnomalyResult, FittedDetector, ModelSlot};
pub use risk::{Recommendation, WasteRiskResult, WasteRiskScorer};
pub use storage::SalesStore;
pub use pipeline::AnalysisPipeline;
pub use logging::StructuredLogger;

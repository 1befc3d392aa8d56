//! Local persistence for sales rows, anomaly predictions, and waste risk results.

mod sqlite;

pub use sqlite::{SalesFilter, SalesStore};

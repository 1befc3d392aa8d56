//! Holder of the current fitted model. Installing swaps an `Arc`; scorers take a
//! snapshot and never observe a half-trained model.

use super::FittedDetector;
use crate::error::{Error, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Default)]
pub struct ModelSlot {
    current: RwLock<Option<Arc<FittedDetector>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: FittedDetector) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(model))),
        }
    }

    /// Replace the current model; returns the installed snapshot.
    pub fn install(&self, model: FittedDetector) -> Arc<FittedDetector> {
        let model = Arc::new(model);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&model));
        info!(
            model_id = %model.model_id,
            replaced = ?previous.map(|p| p.model_id),
            "model installed"
        );
        model
    }

    pub fn snapshot(&self) -> Result<Arc<FittedDetector>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotFitted)
    }

    pub fn is_fitted(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

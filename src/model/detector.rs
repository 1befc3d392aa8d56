//! Anomaly detector: fits an isolation forest over feature vectors and calibrates the
//! normal/anomalous threshold from the contamination fraction.

use super::isolation_forest::{ForestParams, IsolationForest};
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, FeatureVector};
use crate::records::RecordKey;
use chrono::{DateTime, Utc};
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Classification of one record against a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub record_key: RecordKey,
    pub is_anomaly: bool,
    /// Model-relative; lower is more anomalous. Not comparable across fits.
    pub anomaly_score: f64,
    pub model_id: Uuid,
}

pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Train a new immutable model. Nothing shared is touched; install it in a
    /// [`super::ModelSlot`] to make it current.
    pub fn fit(&self, vectors: &[FeatureVector]) -> Result<FittedDetector> {
        self.config.validate()?;
        if vectors.len() < self.config.min_training_samples {
            return Err(Error::InsufficientData {
                required: self.config.min_training_samples,
                actual: vectors.len(),
            });
        }

        let matrix = FeatureMatrix::from_vectors(vectors)?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let forest = IsolationForest::fit(
            &matrix,
            ForestParams {
                n_estimators: self.config.n_estimators,
                max_samples: self.config.max_samples,
            },
            &mut rng,
        );

        let mut scores: Vec<f64> = (0..matrix.nrows()).map(|i| forest.score(matrix.row(i))).collect();
        scores.sort_by(|a, b| a.total_cmp(b));
        let k = ((self.config.contamination * scores.len() as f64).ceil() as usize).clamp(1, scores.len());
        let threshold = scores[k - 1];

        let fitted = FittedDetector {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            training_rows: matrix.nrows(),
            contamination: self.config.contamination,
            threshold,
            forest,
        };
        info!(
            model_id = %fitted.model_id,
            rows = fitted.training_rows,
            trees = fitted.forest.n_trees(),
            sample_size = fitted.forest.sample_size(),
            threshold,
            "isolation forest fitted"
        );
        Ok(fitted)
    }
}

/// A trained model. Immutable: retraining produces a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedDetector {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub contamination: f64,
    /// Scores at or below this are anomalous
    pub threshold: f64,
    forest: IsolationForest,
}

impl FittedDetector {
    pub fn score(&self, vector: &FeatureVector) -> Result<AnomalyResult> {
        if vector.values.len() != self.forest.n_features() {
            return Err(Error::invalid_record(
                &vector.record_key,
                format!(
                    "feature vector has {} values, model expects {}",
                    vector.values.len(),
                    self.forest.n_features()
                ),
            ));
        }
        vector.ensure_finite()?;
        let anomaly_score = self.forest.score(ArrayView1::from(vector.as_slice()));
        Ok(AnomalyResult {
            record_key: vector.record_key.clone(),
            is_anomaly: anomaly_score <= self.threshold,
            anomaly_score,
            model_id: self.model_id,
        })
    }

    pub fn score_all(&self, vectors: &[FeatureVector]) -> Result<Vec<AnomalyResult>> {
        vectors.iter().map(|v| self.score(v)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.forest.n_features()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        info!(path = %path.display(), model_id = %self.model_id, "model saved");
        Ok(())
    }

    /// `Ok(None)` when no model has been saved at `path`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        let model: FittedDetector = serde_json::from_str(&data)?;
        info!(path = %path.display(), model_id = %model.model_id, "model loaded");
        Ok(Some(model))
    }
}

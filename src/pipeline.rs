//! Analysis pipeline: records → features → anomaly detector → waste risk → store.

use crate::config::AppConfig;
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::model::{explain, AnomalyDetector, AnomalyReport, FittedDetector, ModelSlot};
use crate::records::SalesRecord;
use crate::risk::{Recommendation, WasteRiskResult, WasteRiskScorer};
use crate::storage::SalesStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub model_fitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
}

pub struct AnalysisPipeline {
    extractor: FeatureExtractor,
    detector: AnomalyDetector,
    scorer: WasteRiskScorer,
    window: usize,
    model: ModelSlot,
    store: Option<Arc<SalesStore>>,
}

impl AnalysisPipeline {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.features.clone()),
            detector: AnomalyDetector::new(config.detector.clone()),
            scorer: WasteRiskScorer::new(config.risk.clone()),
            window: config.features.window,
            model: ModelSlot::new(),
            store: None,
        })
    }

    /// Persist every detection and risk result to `store`.
    pub fn with_store(mut self, store: Arc<SalesStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Start from a previously trained model instead of an empty slot.
    pub fn with_model(self, model: FittedDetector) -> Self {
        self.model.install(model);
        self
    }

    /// Trailing window size, i.e. how many prior days of history a detection run needs.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn model(&self) -> &ModelSlot {
        &self.model
    }

    /// Fit a fresh model on `records` and make it current.
    pub fn train(&self, records: &[SalesRecord]) -> Result<Arc<FittedDetector>> {
        let vectors = self.extractor.extract(records)?;
        let fitted = self.detector.fit(&vectors)?;
        Ok(self.model.install(fitted))
    }

    /// Score every record against one snapshot of the current model. Rolling windows
    /// start from the batch itself; see [`AnalysisPipeline::detect_with_history`].
    pub fn detect(&self, records: &[SalesRecord]) -> Result<Vec<AnomalyReport>> {
        self.detect_with_history(&[], records)
    }

    /// Like [`AnalysisPipeline::detect`], but `history` (earlier rows of the same series)
    /// warms the rolling windows first. Only `records` are scored and persisted.
    pub fn detect_with_history(
        &self,
        history: &[SalesRecord],
        records: &[SalesRecord],
    ) -> Result<Vec<AnomalyReport>> {
        let model = self.model.snapshot()?;
        let vectors = self.extractor.extract_with_history(history, records)?;
        let reports = records
            .iter()
            .zip(&vectors)
            .map(|(record, vector)| {
                let result = model.score(vector)?;
                let explanation = if result.is_anomaly {
                    explain(record, vector)
                } else {
                    String::new()
                };
                Ok(AnomalyReport { result, explanation })
            })
            .collect::<Result<Vec<_>>>()?;

        let flagged = reports.iter().filter(|r| r.result.is_anomaly).count();
        info!(model_id = %model.model_id, scored = reports.len(), flagged, "anomaly detection complete");

        if let Some(store) = &self.store {
            store.insert_anomalies(&reports)?;
        }
        Ok(reports)
    }

    pub fn waste_risk(&self, records: &[SalesRecord]) -> Result<Vec<WasteRiskResult>> {
        let results = self.scorer.score_records(records, self.window)?;
        let urgent = results
            .iter()
            .filter(|r| r.recommendation == Recommendation::Urgent)
            .count();
        info!(scored = results.len(), urgent, "waste risk scoring complete");

        if let Some(store) = &self.store {
            store.insert_waste_risk(&results)?;
        }
        Ok(results)
    }

    pub fn health(&self) -> Health {
        let model = self.model.snapshot().ok();
        Health {
            model_fitted: model.is_some(),
            model_id: model.map(|m| m.model_id),
        }
    }
}

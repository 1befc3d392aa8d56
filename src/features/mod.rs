//! Feature engineering from raw sales records: cyclical calendar encodings, waste and
//! stock ratios, and causal rolling statistics over each store/product series.

mod pipeline;
mod rolling;
mod temporal;

pub use pipeline::FeatureExtractor;
pub use rolling::{RollingWindow, WindowStats};
pub use temporal::{angle, cyclical, TemporalFeatures, DAYS_PER_WEEK, DAYS_PER_YEAR};

use crate::error::{Error, Result};
use crate::records::RecordKey;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Column layout of every [`FeatureVector`]. The order is part of a fitted model's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    QuantitySold,
    DowSin,
    DowCos,
    DoySin,
    DoyCos,
    RollingMean,
    RollingStd,
    Deviation,
    WindowFill,
    WasteRatio,
    SalesStockRatio,
    RollingWasteMean,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 12] = [
        FeatureColumn::QuantitySold,
        FeatureColumn::DowSin,
        FeatureColumn::DowCos,
        FeatureColumn::DoySin,
        FeatureColumn::DoyCos,
        FeatureColumn::RollingMean,
        FeatureColumn::RollingStd,
        FeatureColumn::Deviation,
        FeatureColumn::WindowFill,
        FeatureColumn::WasteRatio,
        FeatureColumn::SalesStockRatio,
        FeatureColumn::RollingWasteMean,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::QuantitySold => "quantity_sold",
            FeatureColumn::DowSin => "dow_sin",
            FeatureColumn::DowCos => "dow_cos",
            FeatureColumn::DoySin => "doy_sin",
            FeatureColumn::DoyCos => "doy_cos",
            FeatureColumn::RollingMean => "rolling_mean",
            FeatureColumn::RollingStd => "rolling_std",
            FeatureColumn::Deviation => "deviation",
            FeatureColumn::WindowFill => "window_fill",
            FeatureColumn::WasteRatio => "waste_ratio",
            FeatureColumn::SalesStockRatio => "sales_stock_ratio",
            FeatureColumn::RollingWasteMean => "rolling_waste_mean",
        }
    }
}

/// Engineered features for exactly one sales record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub record_key: RecordKey,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, column: FeatureColumn) -> f64 {
        self.values.get(column.index()).copied().unwrap_or(0.0)
    }

    /// Quantities near `f64::MAX` can overflow the rolling sums; such rows cannot be scored.
    pub fn ensure_finite(&self) -> Result<()> {
        match self.values.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(i) => {
                let column = FeatureColumn::ALL.get(i).map_or("unknown", |c| c.name());
                Err(Error::invalid_record(
                    &self.record_key,
                    format!("feature {column} is not finite"),
                ))
            }
        }
    }
}

/// Row-major feature matrix handed to the detector; one row per vector, same order.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    data: Array2<f64>,
}

impl FeatureMatrix {
    pub fn from_vectors(vectors: &[FeatureVector]) -> Result<Self> {
        let ncols = vectors.first().map(|v| v.values.len()).unwrap_or(FeatureColumn::COUNT);
        let mut flat = Vec::with_capacity(vectors.len() * ncols);
        for v in vectors {
            if v.values.len() != ncols {
                return Err(Error::invalid_record(
                    &v.record_key,
                    format!("feature vector has {} values, expected {}", v.values.len(), ncols),
                ));
            }
            v.ensure_finite()?;
            flat.extend_from_slice(&v.values);
        }
        let data = Array2::from_shape_vec((vectors.len(), ncols), flat)
            .map_err(|e| Error::InvalidConfig(format!("feature matrix shape: {e}")))?;
        Ok(Self { data })
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }
}

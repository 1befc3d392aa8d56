//! Application configuration. Every tunable the core uses is reachable from here.

use crate::error::{Error, Result};
use crate::risk::{PerishabilityTable, RiskBreakpoints, RiskRules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data directory (sales database, saved model)
    pub data_dir: PathBuf,
    /// Feature engineering parameters
    pub features: FeaturesConfig,
    /// Isolation forest parameters
    pub detector: DetectorConfig,
    /// Waste risk rule table, breakpoints and perishability weights
    pub risk: RiskConfig,
    /// Synthetic data generation
    pub generator: GeneratorConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Trailing window size for rolling statistics
    pub window: usize,
    /// Reject series shorter than the window instead of using partial history
    pub require_full_window: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected anomaly fraction, in (0, 0.5]
    pub contamination: f64,
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the training set size)
    pub max_samples: usize,
    /// Fewer training rows than this is `InsufficientData`
    pub min_training_samples: usize,
    /// RNG seed, so refits on the same data are reproducible
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub rules: RiskRules,
    pub breakpoints: RiskBreakpoints,
    pub perishability: PerishabilityTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub days: u32,
    pub stores: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".shelfwatch"),
            features: FeaturesConfig::default(),
            detector: DetectorConfig::default(),
            risk: RiskConfig::default(),
            generator: GeneratorConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            window: 7,
            require_full_window: false,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            n_estimators: 100,
            max_samples: 256,
            min_training_samples: 10,
            seed: 42,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 100,
            stores: 3,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Lenient load: any missing, unreadable or invalid file yields the defaults.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_default()
    }

    /// Missing file is the default; unreadable, malformed or out-of-range config is an error.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.detector.validate()?;
        self.risk.rules.validate()?;
        self.risk.breakpoints.validate()?;
        self.risk.perishability.validate()?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sales.db")
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join("model.json")
    }
}

impl FeaturesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::InvalidConfig("features.window must be at least 1".into()));
        }
        Ok(())
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(Error::InvalidConfig(format!(
                "detector.contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.n_estimators == 0 {
            return Err(Error::InvalidConfig("detector.n_estimators must be at least 1".into()));
        }
        if self.max_samples < 2 {
            return Err(Error::InvalidConfig("detector.max_samples must be at least 2".into()));
        }
        if self.min_training_samples < 2 {
            return Err(Error::InvalidConfig(
                "detector.min_training_samples must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

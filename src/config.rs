//! Externally supplied configuration for the forecasting pipeline

use crate::error::{AgriForecastError, Result};
use crate::models::{Autoregressive, ForecastModel, Persistence, SeasonalTrend};
use serde::Deserialize;
use std::path::Path;

/// Pipeline options with agronomic defaults
///
/// Loadable from TOML; every field falls back to its default when omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Days to forecast beyond the last known observation
    pub horizon_length: usize,
    /// Confidence level for forecast uncertainty bands
    pub confidence_level: f64,
    /// Minimum observations a split must hold to be usable
    pub min_split_size: usize,
    /// Upper bound of the AR order grid search
    pub ar_max_order: usize,
    /// Upper bound of AR differencing (0 or 1)
    pub ar_max_differencing: usize,
    /// Trend changepoints for the seasonal-trend model
    pub trend_changepoints: usize,
    /// Base temperature for growing degree days, in degrees C
    pub gdd_base: f64,
    /// Fraction of observed days assigned to the training split
    pub train_fraction: f64,
    /// Fraction of observed days assigned to the validation split
    pub validation_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_length: 14,
            confidence_level: 0.95,
            min_split_size: 30,
            ar_max_order: 5,
            ar_max_differencing: 1,
            trend_changepoints: 5,
            gdd_base: 10.0,
            train_fraction: 0.7,
            validation_fraction: 0.15,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_length == 0 {
            return Err(AgriForecastError::InvalidParameter(
                "horizon_length must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.confidence_level) || self.confidence_level <= 0.0 {
            return Err(AgriForecastError::InvalidParameter(
                "confidence_level must be between 0 and 1".to_string(),
            ));
        }
        if self.min_split_size == 0 {
            return Err(AgriForecastError::InvalidParameter(
                "min_split_size must be at least 1".to_string(),
            ));
        }
        if self.train_fraction + self.validation_fraction >= 1.0 {
            return Err(AgriForecastError::InvalidParameter(
                "train_fraction + validation_fraction must leave room for a test split"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate model set the evaluator competes, built from these options
    pub fn candidate_models(&self) -> Result<Vec<Box<dyn ForecastModel>>> {
        Ok(vec![
            Box::new(Persistence::new()),
            Box::new(Autoregressive::new(
                self.ar_max_order,
                self.ar_max_differencing,
            )?),
            Box::new(SeasonalTrend::new(
                self.trend_changepoints,
                self.confidence_level,
            )?),
        ])
    }
}

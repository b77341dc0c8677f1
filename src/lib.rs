//! # Agri Forecast
//!
//! A Rust library for daily weather forecasting and agricultural risk
//! alerting.
//!
//! ## Features
//!
//! - Daily observation handling with per-variable completeness and derived
//!   features (growing degree days, temperature range)
//! - Forecasting models behind one fit/predict contract (Persistence,
//!   Autoregressive, SeasonalTrend)
//! - Leakage-free temporal evaluation with deterministic model selection
//! - Multi-day forecasts with uncertainty bands
//! - Threshold alert rules with per-rule conservative-bound policy, severity,
//!   deduplication, and lead times
//! - Retrospective alert validation against realized observations
//!
//! ## Quick Start
//!
//! ```no_run
//! use agri_forecast::alerts::{AlertLog, RuleSet};
//! use agri_forecast::config::PipelineConfig;
//! use agri_forecast::data::{ObservationStore, WeatherVariable};
//! use agri_forecast::pipeline;
//! use chrono::NaiveDate;
//!
//! # fn main() -> agri_forecast::Result<()> {
//! let store = ObservationStore::from_csv("daily_weather.csv")?;
//! let config = PipelineConfig::default();
//! let rules = RuleSet::agronomic_defaults();
//! let mut log = AlertLog::new();
//!
//! let report = pipeline::run(
//!     &store,
//!     &config,
//!     &rules,
//!     &[
//!         WeatherVariable::TempMean,
//!         WeatherVariable::HumidityMean,
//!         WeatherVariable::Precipitation,
//!     ],
//!     NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
//!     &mut log,
//! )?;
//!
//! pipeline::write_metrics_csv(&report.records, "model_metrics.csv")?;
//! pipeline::write_alert_log_csv(&log, "alert_log.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod forecast;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod split;
pub mod validator;

// Re-export commonly used types
pub use crate::alerts::{Alert, AlertEngine, AlertLog, AlertRule, RuleSet, Severity};
pub use crate::config::PipelineConfig;
pub use crate::data::{DailySeries, Observation, ObservationStore, WeatherVariable};
pub use crate::error::{AgriForecastError, Result};
pub use crate::evaluator::EvaluationRecord;
pub use crate::forecast::Forecast;
pub use crate::models::{ForecastModel, ForecastPoint, ModelId, TrainedModel};
pub use crate::split::{SplitBoundaries, SplitName};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

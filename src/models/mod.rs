//! Forecasting models for daily weather series
//!
//! Every technique implements the same fit/predict contract so the evaluator
//! can treat candidates uniformly. Fitting consults only the training series;
//! trained models are pure functions of their state and the requested dates.

use crate::data::{DailySeries, WeatherVariable};
use crate::error::Result;
use crate::split::SplitName;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;

/// Identifiers for the model variants
///
/// The derived ordering doubles as the simplicity rank used for deterministic
/// tie-breaking: persistence is preferred over more complex models on exact
/// metric ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    Persistence,
    Autoregressive,
    SeasonalTrend,
}

impl ModelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Persistence => "persistence",
            ModelId::Autoregressive => "autoregressive",
            ModelId::SeasonalTrend => "seasonal_trend",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One forecasted day: point estimate with uncertainty bounds
///
/// Models without a native uncertainty band report `lower == upper == point`;
/// callers must handle degenerate bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Point estimate without a native uncertainty band
    pub fn degenerate(date: NaiveDate, point: f64) -> Self {
        Self {
            date,
            point,
            lower: point,
            upper: point,
        }
    }

    pub fn with_bounds(date: NaiveDate, point: f64, lower: f64, upper: f64) -> Self {
        Self {
            date,
            point,
            lower,
            upper,
        }
    }
}

/// Predictions produced by one trained model for one split
#[derive(Debug, Clone)]
pub struct ModelResult {
    pub model_id: ModelId,
    pub variable: WeatherVariable,
    pub split: SplitName,
    pub points: Vec<ForecastPoint>,
}

/// Forecast model that can be fit on a training series
pub trait ForecastModel: Debug {
    /// Identifier of this model variant
    fn id(&self) -> ModelId;

    /// Human-readable name including configuration
    fn name(&self) -> String;

    /// Fit on the training series; deterministic and leakage-free
    fn fit(&self, train: &DailySeries) -> Result<Box<dyn TrainedModel>>;

    /// Variant with a reduced search space, for the bounded retry after a
    /// fit failure; `None` when no reduction exists
    fn reduced(&self) -> Option<Box<dyn ForecastModel>> {
        None
    }
}

/// Trained forecast model
pub trait TrainedModel: Debug {
    fn id(&self) -> ModelId;

    fn name(&self) -> &str;

    /// Multi-step forecast for dates beyond the fitted history
    ///
    /// Pure function of trained state and dates; an empty slice returns an
    /// empty sequence, not an error.
    fn forecast(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>>;

    /// One-step-ahead predictions for each requested date
    ///
    /// `context` supplies realized values; only values on dates strictly
    /// before each requested date may be consulted. Parameters stay fixed at
    /// their fitted values: no incremental refitting.
    fn predict(&self, context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>>;

    /// Multi-step forecast seeded from realized context values
    ///
    /// Recursive models roll forward from the latest context values instead
    /// of the fitted history's tail, so a horizon anchored after the newest
    /// observation reflects everything observed since fitting. Models whose
    /// forecast is a pure function of the date ignore the context.
    fn forecast_from(
        &self,
        context: &DailySeries,
        dates: &[NaiveDate],
    ) -> Result<Vec<ForecastPoint>> {
        let _ = context;
        self.forecast(dates)
    }
}

pub mod autoregressive;
mod linalg;
pub mod persistence;
pub mod seasonal_trend;

pub use autoregressive::Autoregressive;
pub use persistence::Persistence;
pub use seasonal_trend::SeasonalTrend;

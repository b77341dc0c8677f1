//! Multi-day forecast generation using the selected model

use crate::data::{DailySeries, WeatherVariable};
use crate::error::{AgriForecastError, Result};
use crate::evaluator::fit_with_retry;
use crate::models::{ForecastModel, ForecastPoint, ModelId};
use crate::split::SplitBoundaries;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::info;

/// Multi-day forecast for one variable: point estimates plus bounds
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub variable: WeatherVariable,
    pub model_id: ModelId,
    /// Date the forecast was produced; lead times are measured from here
    pub generated_on: NaiveDate,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Create a forecast, validating that horizon dates are contiguous and
    /// strictly increasing with no gaps
    pub fn new(
        variable: WeatherVariable,
        model_id: ModelId,
        generated_on: NaiveDate,
        points: Vec<ForecastPoint>,
    ) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date != pair[0].date + Days::new(1) {
                return Err(AgriForecastError::InvalidParameter(format!(
                    "Forecast horizon for '{}' has a gap between {} and {}",
                    variable, pair[0].date, pair[1].date
                )));
            }
        }
        Ok(Self {
            variable,
            model_id,
            generated_on,
            points,
        })
    }

    pub fn horizon_len(&self) -> usize {
        self.points.len()
    }

    /// Forecast point for a specific horizon date, if covered
    pub fn point_on(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.date == date)
    }

    /// Serialize the forecast to JSON for downstream consumers
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Produce a forecast for the horizon following the last known observation
///
/// The selected candidate is refit on the train-plus-validation history; the
/// test split never feeds a fit. Horizon dates are the `horizon_length`
/// calendar days immediately after the last observation in the series, and
/// recursive models seed their recursion from the full observed series so
/// the horizon reflects everything measured since fitting.
pub fn generate(
    series: &DailySeries,
    boundaries: &SplitBoundaries,
    selected: ModelId,
    candidates: &[Box<dyn ForecastModel>],
    horizon_length: usize,
    generated_on: NaiveDate,
) -> Result<Forecast> {
    let model = candidates
        .iter()
        .find(|c| c.id() == selected)
        .ok_or_else(|| {
            AgriForecastError::InvalidParameter(format!(
                "Selected model '{}' is not among the supplied candidates",
                selected
            ))
        })?;

    let history = series.up_to(boundaries.validation_end);
    if history.is_empty() {
        return Err(AgriForecastError::InsufficientData(format!(
            "Variable '{}' has no observations before the forecast horizon",
            series.variable()
        )));
    }
    let trained = fit_with_retry(model.as_ref(), &history)?;

    let last = series.last_date().ok_or_else(|| {
        AgriForecastError::InsufficientData(format!(
            "Variable '{}' has no observations before the forecast horizon",
            series.variable()
        ))
    })?;
    let horizon_start = last + Days::new(1);
    let dates: Vec<NaiveDate> = (1..=horizon_length as u64)
        .map(|i| last + Days::new(i))
        .collect();
    let points = trained.forecast_from(series, &dates)?;

    info!(
        variable = %series.variable(),
        model = %trained.name(),
        horizon = horizon_length,
        start = %horizon_start,
        "Generated forecast"
    );

    Forecast::new(series.variable(), selected, generated_on, points)
}

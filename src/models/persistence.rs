//! Persistence baseline model
//!
//! Forecast for a date is the last value observed before it. Zero parameters;
//! the bar every other candidate has to clear.

use crate::data::DailySeries;
use crate::error::{AgriForecastError, Result};
use crate::models::{ForecastModel, ForecastPoint, ModelId, TrainedModel};
use chrono::NaiveDate;

/// Persistence model configuration (there is none)
#[derive(Debug, Clone, Default)]
pub struct Persistence;

impl Persistence {
    pub fn new() -> Self {
        Self
    }
}

/// Trained persistence model
#[derive(Debug, Clone)]
pub struct TrainedPersistence {
    name: String,
    last_date: NaiveDate,
    last_value: f64,
}

impl ForecastModel for Persistence {
    fn id(&self) -> ModelId {
        ModelId::Persistence
    }

    fn name(&self) -> String {
        "Persistence".to_string()
    }

    fn fit(&self, train: &DailySeries) -> Result<Box<dyn TrainedModel>> {
        let (last_date, last_value) = train
            .last_date()
            .zip(train.values().last().copied())
            .ok_or_else(|| {
                AgriForecastError::InsufficientData(format!(
                    "Cannot fit persistence on empty series '{}'",
                    train.variable()
                ))
            })?;
        Ok(Box::new(TrainedPersistence {
            name: "Persistence".to_string(),
            last_date,
            last_value,
        }))
    }
}

impl TrainedModel for TrainedPersistence {
    fn id(&self) -> ModelId {
        ModelId::Persistence
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        // Without new observations the persisted value carries the whole horizon
        Ok(dates
            .iter()
            .map(|&date| ForecastPoint::degenerate(date, self.last_value))
            .collect())
    }

    fn predict(&self, context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        let mut points = Vec::with_capacity(dates.len());
        for &date in dates {
            let value = match context.value_before(date) {
                Some((_, value)) => value,
                None if self.last_date < date => self.last_value,
                None => {
                    return Err(AgriForecastError::InsufficientData(format!(
                        "No value before {} available for persistence prediction",
                        date
                    )))
                }
            };
            points.push(ForecastPoint::degenerate(date, value));
        }
        Ok(points)
    }

    fn forecast_from(&self, context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        // The latest realized value persists, wherever the horizon starts
        self.predict(context, dates)
    }
}

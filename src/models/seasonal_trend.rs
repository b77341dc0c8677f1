//! Decomposable trend-plus-seasonality model
//!
//! Fits a piecewise linear trend with evenly spaced changepoints plus yearly
//! and weekly Fourier components by least squares, and emits a symmetric
//! uncertainty band from the residual spread at a configurable confidence
//! level. The fitted curve is a pure function of the calendar date.

use crate::data::DailySeries;
use crate::error::{AgriForecastError, Result};
use crate::models::linalg;
use crate::models::{ForecastModel, ForecastPoint, ModelId, TrainedModel};
use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, Normal};

const YEARLY_PERIOD: f64 = 365.25;
const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_FOURIER_ORDER: usize = 3;
const WEEKLY_FOURIER_ORDER: usize = 3;

/// Fraction of the training span eligible for trend changepoints
const CHANGEPOINT_RANGE: f64 = 0.8;

/// Ridge term keeping the normal equations well conditioned
const FIT_RIDGE: f64 = 1e-6;

/// Seasonal-trend model configuration
#[derive(Debug, Clone)]
pub struct SeasonalTrend {
    changepoints: usize,
    confidence_level: f64,
}

impl SeasonalTrend {
    /// Create a model with the given changepoint count and confidence level
    pub fn new(changepoints: usize, confidence_level: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&confidence_level) || confidence_level <= 0.0 {
            return Err(AgriForecastError::InvalidParameter(
                "Confidence level must be between 0 and 1".to_string(),
            ));
        }
        Ok(Self {
            changepoints,
            confidence_level,
        })
    }

    fn feature_count(&self) -> usize {
        2 + self.changepoints + 2 * YEARLY_FOURIER_ORDER + 2 * WEEKLY_FOURIER_ORDER
    }
}

/// Trained seasonal-trend model
#[derive(Debug, Clone)]
pub struct TrainedSeasonalTrend {
    name: String,
    /// First training date; feature time is measured from here
    origin: NaiveDate,
    /// Changepoint offsets in days from the origin
    changepoints: Vec<f64>,
    coefficients: Vec<f64>,
    /// Residual standard deviation of the fit
    sigma: f64,
    /// Normal quantile matching the configured confidence level
    z_score: f64,
}

fn features(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len() + 12);
    row.push(1.0);
    row.push(t / YEARLY_PERIOD);
    for &cp in changepoints {
        row.push(((t - cp).max(0.0)) / YEARLY_PERIOD);
    }
    for k in 1..=YEARLY_FOURIER_ORDER {
        let angle = 2.0 * std::f64::consts::PI * k as f64 * t / YEARLY_PERIOD;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    for k in 1..=WEEKLY_FOURIER_ORDER {
        let angle = 2.0 * std::f64::consts::PI * k as f64 * t / WEEKLY_PERIOD;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

impl ForecastModel for SeasonalTrend {
    fn id(&self) -> ModelId {
        ModelId::SeasonalTrend
    }

    fn name(&self) -> String {
        format!("SeasonalTrend(changepoints={})", self.changepoints)
    }

    fn fit(&self, train: &DailySeries) -> Result<Box<dyn TrainedModel>> {
        let k = self.feature_count();
        if train.len() < k + 2 {
            return Err(AgriForecastError::InsufficientData(format!(
                "Series '{}' has {} observations; seasonal-trend fit needs at least {}",
                train.variable(),
                train.len(),
                k + 2
            )));
        }
        let origin = train.first_date().expect("non-empty checked above");
        let last = train.last_date().expect("non-empty checked above");
        let span = (last - origin).num_days() as f64;

        // Evenly spaced changepoints over the early part of the span, so the
        // trend near the forecast boundary stays extrapolation-stable
        let changepoints: Vec<f64> = (1..=self.changepoints)
            .map(|i| span * CHANGEPOINT_RANGE * i as f64 / (self.changepoints as f64 + 1.0))
            .collect();

        let rows: Vec<Vec<f64>> = train
            .dates()
            .iter()
            .map(|&date| features((date - origin).num_days() as f64, &changepoints))
            .collect();
        let coefficients = linalg::least_squares(&rows, train.values(), FIT_RIDGE)?;

        let rss: f64 = rows
            .iter()
            .zip(train.values().iter())
            .map(|(row, &y)| {
                let fitted: f64 = row
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(x, c)| x * c)
                    .sum();
                (y - fitted).powi(2)
            })
            .sum();
        let dof = (train.len() - k).max(1) as f64;
        let sigma = (rss / dof).sqrt();

        let standard_normal = Normal::new(0.0, 1.0).map_err(|e| {
            AgriForecastError::InvalidParameter(format!("Standard normal: {}", e))
        })?;
        let z_score = standard_normal.inverse_cdf(0.5 + self.confidence_level / 2.0);

        Ok(Box::new(TrainedSeasonalTrend {
            name: self.name(),
            origin,
            changepoints,
            coefficients,
            sigma,
            z_score,
        }))
    }

    fn reduced(&self) -> Option<Box<dyn ForecastModel>> {
        if self.changepoints > 0 {
            Some(Box::new(SeasonalTrend {
                changepoints: 0,
                confidence_level: self.confidence_level,
            }))
        } else {
            None
        }
    }
}

impl TrainedSeasonalTrend {
    fn point_for(&self, date: NaiveDate) -> ForecastPoint {
        let t = (date - self.origin).num_days() as f64;
        let row = features(t, &self.changepoints);
        let point: f64 = row
            .iter()
            .zip(self.coefficients.iter())
            .map(|(x, c)| x * c)
            .sum();
        let margin = self.z_score * self.sigma;
        ForecastPoint::with_bounds(date, point, point - margin, point + margin)
    }
}

impl TrainedModel for TrainedSeasonalTrend {
    fn id(&self) -> ModelId {
        ModelId::SeasonalTrend
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        Ok(dates.iter().map(|&date| self.point_for(date)).collect())
    }

    fn predict(&self, _context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        // The fitted curve depends only on the date, so one-step-ahead
        // prediction and multi-step forecasting coincide
        self.forecast(dates)
    }
}

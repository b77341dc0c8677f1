//! Autoregressive model with unit-root differencing and AIC order search
//!
//! A Dickey-Fuller style test decides whether the series needs first-order
//! differencing; the AR order is then grid-searched over a bounded space and
//! the minimum-AIC configuration wins. No native uncertainty band.

use crate::data::DailySeries;
use crate::error::{AgriForecastError, Result};
use crate::models::linalg;
use crate::models::{ForecastModel, ForecastPoint, ModelId, TrainedModel};
use chrono::NaiveDate;

/// 5% critical value for the Dickey-Fuller t statistic (constant-only model)
const DICKEY_FULLER_CRITICAL: f64 = -2.86;

/// Autoregressive model configuration
#[derive(Debug, Clone)]
pub struct Autoregressive {
    max_order: usize,
    max_differencing: usize,
}

impl Autoregressive {
    /// Create a model with the given order-search bounds
    pub fn new(max_order: usize, max_differencing: usize) -> Result<Self> {
        if max_order == 0 {
            return Err(AgriForecastError::InvalidParameter(
                "AR max_order must be at least 1".to_string(),
            ));
        }
        if max_differencing > 1 {
            return Err(AgriForecastError::InvalidParameter(
                "AR max_differencing must be 0 or 1".to_string(),
            ));
        }
        Ok(Self {
            max_order,
            max_differencing,
        })
    }
}

/// Trained autoregressive model
#[derive(Debug, Clone)]
pub struct TrainedAutoregressive {
    name: String,
    /// Selected AR order
    order: usize,
    /// Applied differencing order (0 or 1)
    differencing: usize,
    /// Mean of the (differenced) fitting series
    mean: f64,
    /// AR coefficients on the demeaned (differenced) series
    coefficients: Vec<f64>,
    /// Raw training values, used as the recursion seed for forecasting
    history: Vec<f64>,
}

impl ForecastModel for Autoregressive {
    fn id(&self) -> ModelId {
        ModelId::Autoregressive
    }

    fn name(&self) -> String {
        format!("Autoregressive(max_p={})", self.max_order)
    }

    fn fit(&self, train: &DailySeries) -> Result<Box<dyn TrainedModel>> {
        let values = train.values();
        if values.len() < self.max_order + self.max_differencing + 2 {
            return Err(AgriForecastError::InsufficientData(format!(
                "Series '{}' has {} observations; AR order search needs at least {}",
                train.variable(),
                values.len(),
                self.max_order + self.max_differencing + 2
            )));
        }

        // A constant series has nothing to difference or regress on; fall
        // back to the stationary mean model instead of crashing the search.
        let mean_raw = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - mean_raw).powi(2)).sum::<f64>()
            / values.len() as f64;
        if variance == 0.0 {
            return Ok(Box::new(TrainedAutoregressive {
                name: "AR(p=0, d=0)".to_string(),
                order: 0,
                differencing: 0,
                mean: mean_raw,
                coefficients: Vec::new(),
                history: values.to_vec(),
            }));
        }

        let differencing = if self.max_differencing == 0 || is_stationary(values) {
            0
        } else {
            1
        };
        let z = difference(values, differencing);
        let mean = z.iter().sum::<f64>() / z.len() as f64;

        let mut best: Option<(f64, usize, Vec<f64>)> = None;
        for order in 0..=self.max_order {
            if z.len() < order + 2 {
                break;
            }
            let (coefficients, aic) = match fit_order(&z, mean, order) {
                Ok(fitted) => fitted,
                // A singular lag matrix excludes this order, not the model
                Err(AgriForecastError::ModelFit(_)) => continue,
                Err(e) => return Err(e),
            };
            let better = match &best {
                Some((best_aic, _, _)) => aic < *best_aic,
                None => true,
            };
            if better {
                best = Some((aic, order, coefficients));
            }
        }

        let (_, order, coefficients) = best.ok_or_else(|| {
            AgriForecastError::ModelFit(format!(
                "AR order search failed for every order up to {}",
                self.max_order
            ))
        })?;

        Ok(Box::new(TrainedAutoregressive {
            name: format!("AR(p={}, d={})", order, differencing),
            order,
            differencing,
            mean,
            coefficients,
            history: values.to_vec(),
        }))
    }

    fn reduced(&self) -> Option<Box<dyn ForecastModel>> {
        if self.max_order > 1 {
            Some(Box::new(Autoregressive {
                max_order: self.max_order / 2,
                max_differencing: self.max_differencing,
            }))
        } else {
            None
        }
    }
}

impl TrainedAutoregressive {
    /// One-step prediction from the trailing raw values
    ///
    /// `recent` holds `order + differencing` values ending at the day before
    /// the predicted one (for d=1 that yields exactly `order` differences).
    fn step(&self, recent: &[f64]) -> f64 {
        if self.differencing == 0 {
            let mut prediction = self.mean;
            for (j, phi) in self.coefficients.iter().enumerate() {
                prediction += phi * (recent[recent.len() - 1 - j] - self.mean);
            }
            prediction
        } else {
            let diffs: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();
            let mut delta = self.mean;
            for (j, phi) in self.coefficients.iter().enumerate() {
                delta += phi * (diffs[diffs.len() - 1 - j] - self.mean);
            }
            recent[recent.len() - 1] + delta
        }
    }

    fn window(&self) -> usize {
        self.order + self.differencing
    }

    /// Recursive multi-step forecast from a seed of trailing raw values
    ///
    /// The seed must hold at least `window()` values ending at the last
    /// observation before the first forecast date.
    fn roll_forward(&self, mut rolling: Vec<f64>, dates: &[NaiveDate]) -> Vec<ForecastPoint> {
        let mut points = Vec::with_capacity(dates.len());
        for &date in dates {
            let value = if self.window() == 0 {
                self.mean
            } else {
                self.step(&rolling[rolling.len() - self.window()..])
            };
            rolling.push(value);
            points.push(ForecastPoint::degenerate(date, value));
        }
        points
    }
}

impl TrainedModel for TrainedAutoregressive {
    fn id(&self) -> ModelId {
        ModelId::Autoregressive
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        // The fitting guard keeps the history at least window() long
        Ok(self.roll_forward(self.history.clone(), dates))
    }

    fn forecast_from(&self, context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        let seed = context.values();
        if seed.len() < self.window() {
            return Err(AgriForecastError::InsufficientData(format!(
                "Need {} context values to seed an AR({}) forecast, have {}",
                self.window(),
                self.order,
                seed.len()
            )));
        }
        Ok(self.roll_forward(seed.to_vec(), dates))
    }

    fn predict(&self, context: &DailySeries, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        let needed = self.window();
        let mut points = Vec::with_capacity(dates.len());
        for &date in dates {
            let available = context.dates().partition_point(|d| *d < date);
            let value = if needed == 0 {
                // Only reachable for the stationary mean model (p=0, d=0)
                self.mean
            } else {
                if available < needed {
                    return Err(AgriForecastError::InsufficientData(format!(
                        "Need {} values before {} for AR({}) prediction, have {}",
                        needed, date, self.order, available
                    )));
                }
                self.step(&context.values()[available - needed..available])
            };
            points.push(ForecastPoint::degenerate(date, value));
        }
        Ok(points)
    }
}

/// Dickey-Fuller test with constant: regress the first difference on the
/// lagged level and compare the slope's t statistic to the 5% critical value.
fn is_stationary(values: &[f64]) -> bool {
    let n = values.len();
    if n < 4 {
        return true;
    }
    let lagged: Vec<f64> = values[..n - 1].to_vec();
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let m = diffs.len() as f64;

    let x_mean = lagged.iter().sum::<f64>() / m;
    let y_mean = diffs.iter().sum::<f64>() / m;
    let sxx: f64 = lagged.iter().map(|x| (x - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        return true;
    }
    let sxy: f64 = lagged
        .iter()
        .zip(diffs.iter())
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let rss: f64 = lagged
        .iter()
        .zip(diffs.iter())
        .map(|(x, y)| (y - intercept - slope * x).powi(2))
        .sum();
    if m <= 2.0 {
        return true;
    }
    let sigma2 = rss / (m - 2.0);
    let se = (sigma2 / sxx).sqrt();
    if se == 0.0 {
        return slope < 0.0;
    }
    slope / se <= DICKEY_FULLER_CRITICAL
}

/// Difference a series `order` times (order is 0 or 1 here)
fn difference(values: &[f64], order: usize) -> Vec<f64> {
    if order == 0 {
        values.to_vec()
    } else {
        values.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Fit AR(`order`) by least squares on the demeaned series; returns the
/// coefficients and the AIC of the fit.
fn fit_order(z: &[f64], mean: f64, order: usize) -> Result<(Vec<f64>, f64)> {
    let n_eff = z.len() - order;
    let (coefficients, rss) = if order == 0 {
        let rss: f64 = z.iter().map(|v| (v - mean).powi(2)).sum();
        (Vec::new(), rss)
    } else {
        let mut rows = Vec::with_capacity(n_eff);
        let mut targets = Vec::with_capacity(n_eff);
        for t in order..z.len() {
            let row: Vec<f64> = (1..=order).map(|j| z[t - j] - mean).collect();
            rows.push(row);
            targets.push(z[t] - mean);
        }
        let coefficients = linalg::least_squares(&rows, &targets, 0.0)?;
        let rss: f64 = rows
            .iter()
            .zip(targets.iter())
            .map(|(row, target)| {
                let fitted: f64 = row
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(x, phi)| x * phi)
                    .sum();
                (target - fitted).powi(2)
            })
            .sum();
        (coefficients, rss)
    };

    let n = n_eff as f64;
    let aic = n * (rss.max(1e-12) / n).ln() + 2.0 * (order as f64 + 1.0);
    Ok((coefficients, aic))
}

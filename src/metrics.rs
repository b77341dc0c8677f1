//! Metrics for evaluating forecast performance

use crate::error::{AgriForecastError, Result};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

fn check_lengths(forecast: &[f64], actual: &[f64]) -> Result<()> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(AgriForecastError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute error between forecast and actual values
pub fn mean_absolute_error(forecast: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(forecast, actual)?;
    let sum: f64 = forecast
        .iter()
        .zip(actual.iter())
        .map(|(f, a)| (f - a).abs())
        .sum();
    Ok(sum / forecast.len() as f64)
}

/// Root mean squared error between forecast and actual values
pub fn root_mean_squared_error(forecast: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(forecast, actual)?;
    let sum: f64 = forecast
        .iter()
        .zip(actual.iter())
        .map(|(f, a)| (f - a).powi(2))
        .sum();
    Ok((sum / forecast.len() as f64).sqrt())
}

/// Mean absolute percentage error, in percent
///
/// Days with an actual value of exactly zero are skipped, matching the usual
/// MAPE convention for sparse series such as precipitation.
pub fn mean_absolute_percentage_error(forecast: &[f64], actual: &[f64]) -> Result<f64> {
    check_lengths(forecast, actual)?;
    let mut sum = 0.0;
    let mut count = 0usize;
    for (f, a) in forecast.iter().zip(actual.iter()) {
        if *a != 0.0 {
            sum += ((f - a).abs() / a.abs()) * 100.0;
            count += 1;
        }
    }
    if count == 0 {
        return Ok(0.0);
    }
    Ok(sum / count as f64)
}

/// Residual diagnostics exposed alongside the error metrics
///
/// Informational only; a biased or autocorrelated residual series does not
/// automatically reject a candidate model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResidualDiagnostics {
    /// Residual mean (bias check)
    pub mean: f64,
    /// Residual standard deviation
    pub std_dev: f64,
    /// Ljung-Box Q statistic over the first lags
    pub ljung_box_stat: f64,
    /// P-value for the null of no remaining autocorrelation structure
    pub ljung_box_pvalue: f64,
}

/// Compute residual mean, standard deviation and a Ljung-Box check
pub fn residual_diagnostics(residuals: &[f64]) -> Result<ResidualDiagnostics> {
    if residuals.is_empty() {
        return Err(AgriForecastError::InvalidParameter(
            "Residual series is empty".to_string(),
        ));
    }
    let n = residuals.len();
    let mean = residuals.iter().sum::<f64>() / n as f64;
    let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    // Too short or degenerate series carry no autocorrelation evidence
    let lags = (n / 5).min(10);
    if lags == 0 || variance == 0.0 {
        return Ok(ResidualDiagnostics {
            mean,
            std_dev,
            ljung_box_stat: 0.0,
            ljung_box_pvalue: 1.0,
        });
    }

    let denominator: f64 = residuals.iter().map(|r| (r - mean).powi(2)).sum();
    let mut q = 0.0;
    for k in 1..=lags {
        let numerator: f64 = residuals[k..]
            .iter()
            .zip(residuals.iter())
            .map(|(a, b)| (a - mean) * (b - mean))
            .sum();
        let r_k = numerator / denominator;
        q += r_k * r_k / (n - k) as f64;
    }
    q *= n as f64 * (n as f64 + 2.0);

    let chi2 = ChiSquared::new(lags as f64).map_err(|e| {
        AgriForecastError::InvalidParameter(format!("Chi-squared with {} dof: {}", lags, e))
    })?;
    let pvalue = 1.0 - chi2.cdf(q);

    Ok(ResidualDiagnostics {
        mean,
        std_dev,
        ljung_box_stat: q,
        ljung_box_pvalue: pvalue,
    })
}

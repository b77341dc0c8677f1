//! Temporal evaluation of candidate models and per-variable selection
//!
//! Observations are partitioned strictly by date. Candidates are fit once on
//! the training split and applied unchanged to validation and test; selection
//! reads validation metrics only, so the test split is touched exactly once
//! for final reporting and never influences the choice.

use crate::data::{DailySeries, WeatherVariable};
use crate::error::{AgriForecastError, Result};
use crate::metrics::{
    mean_absolute_error, mean_absolute_percentage_error, residual_diagnostics,
    root_mean_squared_error,
};
use crate::models::{ForecastModel, ForecastPoint, ModelId, ModelResult, TrainedModel};
use crate::split::{SplitBoundaries, SplitName};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Error metrics and residual diagnostics for one (model, variable, split)
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub model_id: ModelId,
    pub variable: WeatherVariable,
    pub split: SplitName,
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub residual_mean: f64,
    pub residual_std: f64,
    pub ljung_box_stat: f64,
    pub ljung_box_pvalue: f64,
}

/// A candidate removed from the competition for this variable
#[derive(Debug, Clone)]
pub struct ExcludedCandidate {
    pub model_id: ModelId,
    pub name: String,
    pub reason: String,
}

/// Full evaluation output for one variable
#[derive(Debug)]
pub struct VariableEvaluation {
    pub variable: WeatherVariable,
    pub records: Vec<EvaluationRecord>,
    pub results: Vec<ModelResult>,
    pub excluded: Vec<ExcludedCandidate>,
    /// Winning model on the validation split
    pub selected: ModelId,
}

/// Evaluate all candidates for one variable and select the winner
pub fn evaluate_variable(
    series: &DailySeries,
    boundaries: &SplitBoundaries,
    candidates: &[Box<dyn ForecastModel>],
    min_split_size: usize,
) -> Result<VariableEvaluation> {
    let variable = series.variable();
    for split in SplitName::ALL {
        let window = boundaries.window(series, split);
        if window.len() < min_split_size {
            return Err(AgriForecastError::InsufficientData(format!(
                "Variable '{}' has {} observations in the {} split; at least {} required",
                variable,
                window.len(),
                split,
                min_split_size
            )));
        }
    }

    let train = boundaries.window(series, SplitName::Train);
    let mut records = Vec::new();
    let mut results = Vec::new();
    let mut excluded = Vec::new();

    for candidate in candidates {
        let trained = match fit_with_retry(candidate.as_ref(), &train) {
            Ok(trained) => trained,
            Err(AgriForecastError::ModelFit(reason))
            | Err(AgriForecastError::InsufficientData(reason)) => {
                warn!(
                    variable = %variable,
                    model = %candidate.name(),
                    %reason,
                    "Excluding candidate after failed fit"
                );
                excluded.push(ExcludedCandidate {
                    model_id: candidate.id(),
                    name: candidate.name(),
                    reason,
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        for split in SplitName::ALL {
            let window = boundaries.window(series, split);
            let points = predict_window(trained.as_ref(), series, &window)?;
            if points.is_empty() {
                continue;
            }
            let record = score_points(&points, &window, trained.id(), variable, split)?;
            debug!(
                variable = %variable,
                model = %trained.name(),
                split = %split,
                mae = record.mae,
                rmse = record.rmse,
                "Scored candidate"
            );
            records.push(record);
            results.push(ModelResult {
                model_id: trained.id(),
                variable,
                split,
                points,
            });
        }
    }

    let selected = select_model(&records).ok_or_else(|| {
        AgriForecastError::ModelFit(format!(
            "No candidate model could be evaluated for variable '{}'",
            variable
        ))
    })?;
    info!(variable = %variable, model = %selected, "Selected forecasting model");

    Ok(VariableEvaluation {
        variable,
        records,
        results,
        excluded,
        selected,
    })
}

/// Fit a candidate; on non-convergence retry once with a reduced search
/// space, then give up on the candidate.
pub(crate) fn fit_with_retry(
    model: &dyn ForecastModel,
    train: &DailySeries,
) -> Result<Box<dyn TrainedModel>> {
    match model.fit(train) {
        Err(AgriForecastError::ModelFit(reason)) => match model.reduced() {
            Some(reduced) => {
                warn!(
                    model = %model.name(),
                    retry = %reduced.name(),
                    %reason,
                    "Fit failed; retrying with reduced search space"
                );
                reduced.fit(train)
            }
            None => Err(AgriForecastError::ModelFit(reason)),
        },
        other => other,
    }
}

/// One-step-ahead predictions across a split window
///
/// The context is capped at the window's end so a model can read realized
/// values before each predicted date but nothing later. Leading dates with
/// too little history (warm-up) are skipped rather than failing the split.
fn predict_window(
    trained: &dyn TrainedModel,
    series: &DailySeries,
    window: &DailySeries,
) -> Result<Vec<ForecastPoint>> {
    let Some(end) = window.last_date() else {
        return Ok(Vec::new());
    };
    let context = series.up_to(end);
    let mut points = Vec::with_capacity(window.len());
    for &date in window.dates() {
        match trained.predict(&context, &[date]) {
            Ok(mut predicted) => points.append(&mut predicted),
            Err(AgriForecastError::InsufficientData(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(points)
}

fn score_points(
    points: &[ForecastPoint],
    window: &DailySeries,
    model_id: ModelId,
    variable: WeatherVariable,
    split: SplitName,
) -> Result<EvaluationRecord> {
    let mut forecast = Vec::with_capacity(points.len());
    let mut actual = Vec::with_capacity(points.len());
    for point in points {
        let observed = window.value_on(point.date).ok_or_else(|| {
            AgriForecastError::DataQuality(format!(
                "Prediction for {} has no matching observation in the {} split",
                point.date, split
            ))
        })?;
        forecast.push(point.point);
        actual.push(observed);
    }

    let residuals: Vec<f64> = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| a - f)
        .collect();
    let diagnostics = residual_diagnostics(&residuals)?;

    Ok(EvaluationRecord {
        model_id,
        variable,
        split,
        mae: mean_absolute_error(&forecast, &actual)?,
        rmse: root_mean_squared_error(&forecast, &actual)?,
        mape: mean_absolute_percentage_error(&forecast, &actual)?,
        residual_mean: diagnostics.mean,
        residual_std: diagnostics.std_dev,
        ljung_box_stat: diagnostics.ljung_box_stat,
        ljung_box_pvalue: diagnostics.ljung_box_pvalue,
    })
}

/// Pick the winner from validation records: minimum MAE, ties broken by
/// RMSE, remaining ties by simplicity (persistence before autoregressive
/// before seasonal-trend). Deterministic by construction.
fn select_model(records: &[EvaluationRecord]) -> Option<ModelId> {
    records
        .iter()
        .filter(|r| r.split == SplitName::Validation)
        .min_by(|a, b| {
            a.mae
                .total_cmp(&b.mae)
                .then(a.rmse.total_cmp(&b.rmse))
                .then(a.model_id.cmp(&b.model_id))
        })
        .map(|r| r.model_id)
}

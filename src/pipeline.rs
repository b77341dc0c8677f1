//! End-to-end batch pipeline: evaluate, forecast, alert
//!
//! Per-variable failures are isolated and collected so one bad variable does
//! not abort the run; the report states exactly which variables and rules
//! succeeded and which were omitted.

use crate::alerts::{AlertEngine, AlertLog, EngineRun, RuleSet};
use crate::config::PipelineConfig;
use crate::data::{ObservationStore, WeatherVariable};
use crate::error::Result;
use crate::evaluator::{evaluate_variable, EvaluationRecord, ExcludedCandidate};
use crate::forecast::{self, Forecast};
use crate::models::ModelId;
use crate::split::SplitBoundaries;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Winning model per variable, chosen on validation metrics only
pub type SelectedModel = BTreeMap<WeatherVariable, ModelId>;

/// A variable whose evaluation or forecast failed; the rest of the run
/// proceeds without it
#[derive(Debug, Clone)]
pub struct VariableFailure {
    pub variable: WeatherVariable,
    pub reason: String,
}

/// Everything a pipeline run produced, including explicit omissions
#[derive(Debug)]
pub struct PipelineReport {
    /// One row per (model, variable, split)
    pub records: Vec<EvaluationRecord>,
    pub selected: SelectedModel,
    pub forecasts: BTreeMap<WeatherVariable, Forecast>,
    pub engine_run: EngineRun,
    /// Candidates excluded during evaluation, per variable
    pub exclusions: Vec<(WeatherVariable, ExcludedCandidate)>,
    /// Variables dropped from the run entirely
    pub failures: Vec<VariableFailure>,
}

/// Run the full pipeline over the given variables
///
/// New alerts land in `log`, which carries the dedup index across runs.
pub fn run(
    store: &ObservationStore,
    config: &PipelineConfig,
    rules: &RuleSet,
    variables: &[WeatherVariable],
    generated_on: NaiveDate,
    log: &mut AlertLog,
) -> Result<PipelineReport> {
    config.validate()?;
    let candidates = config.candidate_models()?;
    let engine = AlertEngine::new(rules.clone())?;

    let mut records = Vec::new();
    let mut selected = SelectedModel::new();
    let mut forecasts = BTreeMap::new();
    let mut exclusions = Vec::new();
    let mut failures = Vec::new();

    for &variable in variables {
        let outcome = (|| -> Result<()> {
            let series = store.series(variable)?;
            let boundaries = SplitBoundaries::from_fractions(
                &series,
                config.train_fraction,
                config.validation_fraction,
            )?;
            let evaluation =
                evaluate_variable(&series, &boundaries, &candidates, config.min_split_size)?;
            let forecast = forecast::generate(
                &series,
                &boundaries,
                evaluation.selected,
                &candidates,
                config.horizon_length,
                generated_on,
            )?;

            records.extend(evaluation.records);
            exclusions.extend(
                evaluation
                    .excluded
                    .into_iter()
                    .map(|excluded| (variable, excluded)),
            );
            selected.insert(variable, evaluation.selected);
            forecasts.insert(variable, forecast);
            Ok(())
        })();

        if let Err(e) = outcome {
            warn!(variable = %variable, reason = %e, "Variable dropped from pipeline run");
            failures.push(VariableFailure {
                variable,
                reason: e.to_string(),
            });
        }
    }

    let engine_run = engine.evaluate(&forecasts, generated_on, log);
    info!(
        variables_ok = forecasts.len(),
        variables_failed = failures.len(),
        new_alerts = engine_run.alerts.len(),
        rules_skipped = engine_run.skipped.len(),
        "Pipeline run complete"
    );

    Ok(PipelineReport {
        records,
        selected,
        forecasts,
        engine_run,
        exclusions,
        failures,
    })
}

/// Write the evaluation metrics table consumed by the dashboard
pub fn write_metrics_csv<P: AsRef<Path>>(records: &[EvaluationRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the per-variable forecasts as one JSON document
pub fn write_forecasts_json<P: AsRef<Path>>(
    forecasts: &BTreeMap<WeatherVariable, Forecast>,
    path: P,
) -> Result<()> {
    let text = serde_json::to_string_pretty(forecasts)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct AlertRow<'a> {
    rule_id: &'a str,
    target_date: NaiveDate,
    severity: &'a str,
    generated_on: NaiveDate,
    lead_time_days: i64,
    message: &'a str,
    recommended_actions: String,
}

/// Write the alert log table consumed by the dashboard
pub fn write_alert_log_csv<P: AsRef<Path>>(log: &AlertLog, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for alert in log.alerts() {
        writer.serialize(AlertRow {
            rule_id: &alert.rule_id,
            target_date: alert.target_date,
            severity: alert.severity.as_str(),
            generated_on: alert.generated_on,
            lead_time_days: alert.lead_time_days,
            message: &alert.message,
            recommended_actions: alert.actions.join("; "),
        })?;
    }
    writer.flush()?;
    Ok(())
}

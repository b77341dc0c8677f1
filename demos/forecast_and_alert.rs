//! End-to-end demo: evaluate models, forecast two weeks ahead, raise alerts
//!
//! Runs on three years of synthetic daily weather so it needs no input file.
//!
//! Run with: cargo run --example forecast_and_alert

use agri_forecast::alerts::{AlertLog, RuleSet};
use agri_forecast::config::PipelineConfig;
use agri_forecast::data::{Observation, ObservationStore, WeatherVariable};
use agri_forecast::{pipeline, validator};
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

fn synthetic_store(start: NaiveDate, days: usize) -> agri_forecast::Result<ObservationStore> {
    let mut observations = Vec::with_capacity(days);
    for i in 0..days {
        let date = start + Days::new(i as u64);
        let t = i as f64;
        let seasonal = (2.0 * std::f64::consts::PI * t / 365.25).sin();

        // Mid-latitude climate sketch: cold winters, humid shoulder seasons,
        // rain spikes every eleven days
        let temp_mean = 10.0 + 14.0 * seasonal + 2.0 * (t / 5.0).sin();
        let humidity = 75.0 - 10.0 * seasonal + 8.0 * (t / 9.0).cos();
        let precipitation = if i % 11 == 0 { 18.0 + 12.0 * seasonal.abs() } else { 1.5 };

        let mut values = BTreeMap::new();
        values.insert(WeatherVariable::TempMean, temp_mean);
        values.insert(WeatherVariable::TempMin, temp_mean - 5.0);
        values.insert(WeatherVariable::TempMax, temp_mean + 5.0);
        values.insert(WeatherVariable::HumidityMean, humidity.clamp(0.0, 100.0));
        values.insert(WeatherVariable::Precipitation, precipitation);
        observations.push(Observation::new(date, values));
    }
    ObservationStore::new(observations)
}

fn main() -> agri_forecast::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let start = NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date");
    let store = synthetic_store(start, 3 * 365)?;
    println!(
        "Loaded {} synthetic observations ({} to {})",
        store.len(),
        store.first_date().expect("non-empty"),
        store.last_date().expect("non-empty"),
    );

    let config = PipelineConfig::default();
    let rules = RuleSet::agronomic_defaults();
    let mut log = AlertLog::new();
    let variables = [
        WeatherVariable::TempMean,
        WeatherVariable::HumidityMean,
        WeatherVariable::Precipitation,
    ];

    let generated_on = store.last_date().expect("non-empty");
    let report = pipeline::run(&store, &config, &rules, &variables, generated_on, &mut log)?;

    println!("\nModel selection (validation MAE, ties by RMSE then simplicity):");
    for (variable, model_id) in &report.selected {
        println!("  {:<14} -> {}", variable.to_string(), model_id);
    }

    println!("\nEvaluation metrics:");
    println!(
        "  {:<14} {:<14} {:<11} {:>8} {:>8} {:>8}",
        "variable", "model", "split", "MAE", "RMSE", "MAPE%"
    );
    for record in &report.records {
        println!(
            "  {:<14} {:<14} {:<11} {:>8.3} {:>8.3} {:>8.2}",
            record.variable.to_string(),
            record.model_id.to_string(),
            record.split.to_string(),
            record.mae,
            record.rmse,
            record.mape,
        );
    }

    println!("\nAlerts ({} new):", report.engine_run.alerts.len());
    for alert in &report.engine_run.alerts {
        println!(
            "  [{}] {} lead={}d  {}",
            alert.severity, alert.target_date, alert.lead_time_days, alert.message
        );
    }
    for skipped in &report.engine_run.skipped {
        println!("  skipped rule '{}': {}", skipped.rule_id, skipped.reason);
    }

    // Retrospective check of the log against the observed history
    let validation = validator::score(&log, &store, &rules);
    println!("\nRetrospective rule scores:");
    for (rule_id, score) in &validation.scores {
        match score.detection_rate {
            Some(rate) => println!(
                "  {:<22} detection {:.0}%  (TP {} / FN {} / FP {})",
                rule_id,
                rate * 100.0,
                score.true_positives,
                score.false_negatives,
                score.false_positives
            ),
            None => println!("  {:<22} no actual trigger days", rule_id),
        }
    }

    pipeline::write_metrics_csv(&report.records, "model_metrics.csv")?;
    pipeline::write_alert_log_csv(&log, "alert_log.csv")?;
    println!("\nWrote model_metrics.csv and alert_log.csv");

    Ok(())
}

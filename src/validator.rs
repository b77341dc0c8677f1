//! Retrospective scoring of emitted alerts against realized observations
//!
//! Pure computation: rules are replayed against ground truth (never against
//! forecasts) and matched to the alert log by (rule_id, target_date). The
//! alert log is never mutated.

use crate::alerts::{AlertLog, AlertRule, RuleSet};
use crate::data::ObservationStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One replayed (rule, date) pair
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub rule_id: String,
    pub target_date: NaiveDate,
    /// Whether the rule triggers on the realized observation
    pub actual_triggered: bool,
    /// Whether an actual trigger was covered by an emitted alert
    pub matched: bool,
}

/// Detection statistics for one rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleScore {
    pub rule_id: String,
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    /// TP / (TP + FN); `None` when the rule never actually triggered
    pub detection_rate: Option<f64>,
}

/// Per-rule scores plus the underlying outcome records
#[derive(Debug)]
pub struct ValidationReport {
    pub scores: BTreeMap<String, RuleScore>,
    pub outcomes: Vec<ValidationOutcome>,
}

/// Replay the rules over realized observations and score the alert log
pub fn score(log: &AlertLog, store: &ObservationStore, rules: &RuleSet) -> ValidationReport {
    let mut scores = BTreeMap::new();
    let mut outcomes = Vec::new();

    let range = match (store.first_date(), store.last_date()) {
        (Some(first), Some(last)) => Some((first, last)),
        _ => None,
    };

    for rule in &rules.rules {
        let actual_triggers = actual_trigger_days(rule, store);
        let alerted: BTreeSet<NaiveDate> = log
            .alerts()
            .iter()
            .filter(|a| a.rule_id == rule.id)
            .filter(|a| match range {
                Some((first, last)) => a.target_date >= first && a.target_date <= last,
                None => false,
            })
            .map(|a| a.target_date)
            .collect();

        let mut true_positives = 0;
        let mut false_negatives = 0;
        let mut false_positives = 0;
        for &date in actual_triggers.union(&alerted) {
            let actual_triggered = actual_triggers.contains(&date);
            let has_alert = alerted.contains(&date);
            match (actual_triggered, has_alert) {
                (true, true) => true_positives += 1,
                (true, false) => false_negatives += 1,
                (false, true) => false_positives += 1,
                (false, false) => unreachable!("date drawn from the union"),
            }
            outcomes.push(ValidationOutcome {
                rule_id: rule.id.clone(),
                target_date: date,
                actual_triggered,
                matched: actual_triggered && has_alert,
            });
        }

        let positives = true_positives + false_negatives;
        scores.insert(
            rule.id.clone(),
            RuleScore {
                rule_id: rule.id.clone(),
                true_positives,
                false_negatives,
                false_positives,
                detection_rate: if positives > 0 {
                    Some(true_positives as f64 / positives as f64)
                } else {
                    None
                },
            },
        );
    }

    ValidationReport { scores, outcomes }
}

/// Days on which the rule triggers against ground truth
///
/// Days where any referenced variable was not measured are not evaluable and
/// are left out rather than defaulted.
fn actual_trigger_days(rule: &AlertRule, store: &ObservationStore) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    for observation in store.observations() {
        let mut all_met = true;
        for condition in &rule.conditions {
            match observation.value(condition.variable) {
                Some(value) if condition.check_actual(value) => {}
                _ => {
                    all_met = false;
                    break;
                }
            }
        }
        if all_met {
            days.insert(observation.date);
        }
    }
    days
}

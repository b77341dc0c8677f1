//! Agricultural risk alerts evaluated against forecast values
//!
//! Rules are static configuration: one or more per-variable threshold tests
//! ANDed together, a severity, and a recommended action list. Rules flagged
//! conservative read the pessimistic uncertainty bound (the bound that makes
//! the rule more likely to trigger) instead of the point estimate, trading
//! false positives for fewer missed events.

use crate::data::WeatherVariable;
use crate::error::{AgriForecastError, Result};
use crate::forecast::Forecast;
use crate::models::ForecastPoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Alert severity bands
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold test applied to one variable's forecast value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTest {
    Below { threshold: f64 },
    Above { threshold: f64 },
    Between { min: f64, max: f64 },
}

/// One variable/test pair inside a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    pub variable: WeatherVariable,
    pub test: ConditionTest,
}

impl RuleCondition {
    /// Evaluate the test against a forecast point
    ///
    /// Conservative rules read the bound that increases trigger likelihood:
    /// the lower bound for `Below`, the upper bound for `Above`. `Between`
    /// always reads the point estimate since neither bound is uniformly
    /// pessimistic for a two-sided test.
    fn check(&self, point: &ForecastPoint, conservative: bool) -> (bool, f64) {
        match self.test {
            ConditionTest::Below { threshold } => {
                let value = if conservative { point.lower } else { point.point };
                (value < threshold, value)
            }
            ConditionTest::Above { threshold } => {
                let value = if conservative { point.upper } else { point.point };
                (value > threshold, value)
            }
            ConditionTest::Between { min, max } => {
                let value = point.point;
                (value >= min && value <= max, value)
            }
        }
    }

    /// Evaluate the test against a realized observation (ground truth has no
    /// uncertainty bounds, so point semantics apply)
    pub(crate) fn check_actual(&self, value: f64) -> bool {
        match self.test {
            ConditionTest::Below { threshold } => value < threshold,
            ConditionTest::Above { threshold } => value > threshold,
            ConditionTest::Between { min, max } => value >= min && value <= max,
        }
    }
}

/// A configured alert rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub severity: Severity,
    /// Use pessimistic uncertainty bounds instead of point estimates
    #[serde(default)]
    pub conservative: bool,
    /// Conditions ANDed together; cross-variable conditions join forecasts
    /// by date
    pub conditions: Vec<RuleCondition>,
    /// Message template; `{value}` and `{date}` are substituted
    pub message: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl AlertRule {
    fn render_message(&self, value: f64, date: NaiveDate) -> String {
        self.message
            .replace("{value}", &format!("{:.1}", value))
            .replace("{date}", &date.to_string())
    }
}

/// Ordered collection of alert rules, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<AlertRule>,
}

impl RuleSet {
    /// Parse a rule set from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let set: RuleSet = toml::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a rule set from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if rule.conditions.is_empty() {
                return Err(AgriForecastError::Config(format!(
                    "Rule '{}' has no conditions",
                    rule.id
                )));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(AgriForecastError::Config(format!(
                    "Duplicate rule id '{}'",
                    rule.id
                )));
            }
        }
        Ok(())
    }

    /// The standard agronomic rule set: frost, heat stress, two disease-risk
    /// tiers, and heavy rain
    pub fn agronomic_defaults() -> Self {
        Self {
            rules: vec![
                AlertRule {
                    id: "frost_warning".to_string(),
                    severity: Severity::High,
                    conservative: true,
                    conditions: vec![RuleCondition {
                        variable: WeatherVariable::TempMean,
                        test: ConditionTest::Below { threshold: 0.0 },
                    }],
                    message: "FROST WARNING: temperature forecast {value} degC (below 0 degC)"
                        .to_string(),
                    actions: vec![
                        "Cover sensitive crops".to_string(),
                        "Delay planting".to_string(),
                    ],
                },
                AlertRule {
                    id: "heat_stress".to_string(),
                    severity: Severity::Medium,
                    conservative: true,
                    conditions: vec![RuleCondition {
                        variable: WeatherVariable::TempMean,
                        test: ConditionTest::Above { threshold: 30.0 },
                    }],
                    message: "HEAT STRESS: temperature forecast {value} degC (above 30 degC)"
                        .to_string(),
                    actions: vec![
                        "Increase irrigation".to_string(),
                        "Monitor crop health".to_string(),
                    ],
                },
                AlertRule {
                    id: "disease_risk_high".to_string(),
                    severity: Severity::High,
                    conservative: false,
                    conditions: vec![
                        RuleCondition {
                            variable: WeatherVariable::HumidityMean,
                            test: ConditionTest::Above { threshold: 90.0 },
                        },
                        RuleCondition {
                            variable: WeatherVariable::TempMean,
                            test: ConditionTest::Between {
                                min: 15.0,
                                max: 25.0,
                            },
                        },
                    ],
                    message: "HIGH DISEASE RISK: humidity {value}% with mild temperatures on {date}"
                        .to_string(),
                    actions: vec![
                        "Apply preventive fungicides".to_string(),
                        "Monitor closely".to_string(),
                    ],
                },
                AlertRule {
                    id: "disease_risk_moderate".to_string(),
                    severity: Severity::Medium,
                    conservative: false,
                    conditions: vec![
                        RuleCondition {
                            variable: WeatherVariable::HumidityMean,
                            test: ConditionTest::Above { threshold: 85.0 },
                        },
                        RuleCondition {
                            variable: WeatherVariable::TempMean,
                            test: ConditionTest::Between {
                                min: 10.0,
                                max: 30.0,
                            },
                        },
                    ],
                    message: "MODERATE DISEASE RISK: humidity {value}% on {date}".to_string(),
                    actions: vec!["Increase scouting frequency".to_string()],
                },
                AlertRule {
                    id: "heavy_rain".to_string(),
                    severity: Severity::High,
                    conservative: true,
                    conditions: vec![RuleCondition {
                        variable: WeatherVariable::Precipitation,
                        test: ConditionTest::Above { threshold: 25.0 },
                    }],
                    message: "HEAVY RAIN: precipitation forecast {value} mm (above 25 mm)"
                        .to_string(),
                    actions: vec![
                        "Check drainage".to_string(),
                        "Delay field operations".to_string(),
                    ],
                },
            ],
        }
    }
}

/// A risk alert for one rule and one forecasted date
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub rule_id: String,
    pub target_date: NaiveDate,
    pub severity: Severity,
    pub generated_on: NaiveDate,
    /// Days between generation and the forecasted event
    pub lead_time_days: i64,
    pub message: String,
    pub actions: Vec<String>,
}

/// Append-only alert collection, keyed by (rule_id, target_date)
///
/// The key index is checked at insertion time so re-running evaluation over
/// an overlapping horizon stays idempotent without a post-hoc scan.
#[derive(Debug, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
    index: BTreeSet<(String, NaiveDate)>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn contains(&self, rule_id: &str, target_date: NaiveDate) -> bool {
        self.index
            .contains(&(rule_id.to_string(), target_date))
    }

    /// Insert an alert unless its (rule_id, target_date) key already exists;
    /// returns whether the alert was added
    pub fn insert(&mut self, alert: Alert) -> bool {
        let key = (alert.rule_id.clone(), alert.target_date);
        if self.index.contains(&key) {
            return false;
        }
        self.index.insert(key);
        self.alerts.push(alert);
        true
    }
}

/// A rule skipped because a referenced variable had no forecast
#[derive(Debug, Clone)]
pub struct SkippedRule {
    pub rule_id: String,
    pub variable: WeatherVariable,
    pub reason: String,
}

/// Outcome of one engine evaluation pass
#[derive(Debug)]
pub struct EngineRun {
    /// Newly created alerts, severity descending then target date ascending
    pub alerts: Vec<Alert>,
    /// Rules that could not be evaluated, reported rather than silently dropped
    pub skipped: Vec<SkippedRule>,
}

/// Evaluates the rule set against per-variable forecasts
#[derive(Debug)]
pub struct AlertEngine {
    rules: RuleSet,
}

impl AlertEngine {
    pub fn new(rules: RuleSet) -> Result<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules.rules
    }

    /// Evaluate every rule against every horizon date
    ///
    /// New alerts are appended to `log`; duplicates by (rule_id, target_date)
    /// are suppressed there. Lead time is measured from `generated_on`, not
    /// from the wall clock, so historical logs stay reproducible.
    pub fn evaluate(
        &self,
        forecasts: &BTreeMap<WeatherVariable, Forecast>,
        generated_on: NaiveDate,
        log: &mut AlertLog,
    ) -> EngineRun {
        let mut new_alerts = Vec::new();
        let mut skipped = Vec::new();

        for rule in &self.rules.rules {
            let missing = rule
                .conditions
                .iter()
                .find(|c| !forecasts.contains_key(&c.variable));
            if let Some(condition) = missing {
                let reason =
                    AgriForecastError::MissingVariable(condition.variable.to_string()).to_string();
                warn!(rule = %rule.id, %reason, "Skipping rule");
                skipped.push(SkippedRule {
                    rule_id: rule.id.clone(),
                    variable: condition.variable,
                    reason,
                });
                continue;
            }

            // Join the referenced forecasts by date; dates missing from any
            // referenced horizon are not evaluable for this rule
            let lead_forecast = &forecasts[&rule.conditions[0].variable];
            for lead_point in &lead_forecast.points {
                let date = lead_point.date;
                let mut all_met = true;
                let mut trigger_value = f64::NAN;
                for (idx, condition) in rule.conditions.iter().enumerate() {
                    let Some(point) = forecasts[&condition.variable].point_on(date) else {
                        all_met = false;
                        break;
                    };
                    let (met, value) = condition.check(point, rule.conservative);
                    if idx == 0 {
                        trigger_value = value;
                    }
                    if !met {
                        all_met = false;
                        break;
                    }
                }
                if !all_met {
                    continue;
                }

                let alert = Alert {
                    rule_id: rule.id.clone(),
                    target_date: date,
                    severity: rule.severity,
                    generated_on,
                    lead_time_days: (date - generated_on).num_days(),
                    message: rule.render_message(trigger_value, date),
                    actions: rule.actions.clone(),
                };
                if log.insert(alert.clone()) {
                    new_alerts.push(alert);
                } else {
                    debug!(rule = %rule.id, date = %date, "Duplicate alert suppressed");
                }
            }
        }

        new_alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.target_date.cmp(&b.target_date))
        });

        EngineRun {
            alerts: new_alerts,
            skipped,
        }
    }
}

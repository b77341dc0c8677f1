//! Daily weather observations and per-variable series extraction

use crate::error::{AgriForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Cell contents treated as missing values in the input table
const MISSING_MARKERS: [&str; 5] = ["", "na", "nan", "-99", "-999"];

/// Daily weather variables the observation store recognizes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    TempMin,
    TempMax,
    TempMean,
    HumidityMean,
    Precipitation,
    LeafWetness,
}

impl WeatherVariable {
    /// All recognized variables, in canonical order
    pub const ALL: [WeatherVariable; 6] = [
        WeatherVariable::TempMin,
        WeatherVariable::TempMax,
        WeatherVariable::TempMean,
        WeatherVariable::HumidityMean,
        WeatherVariable::Precipitation,
        WeatherVariable::LeafWetness,
    ];

    /// Canonical column name for this variable
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherVariable::TempMin => "temp_min",
            WeatherVariable::TempMax => "temp_max",
            WeatherVariable::TempMean => "temp_mean",
            WeatherVariable::HumidityMean => "humidity_mean",
            WeatherVariable::Precipitation => "precipitation",
            WeatherVariable::LeafWetness => "leaf_wetness",
        }
    }

    /// Match a table header against canonical names and MAWN-style aliases
    fn from_column_name(name: &str) -> Option<WeatherVariable> {
        match name.to_lowercase().as_str() {
            "temp_min" | "atmp_min" => Some(WeatherVariable::TempMin),
            "temp_max" | "atmp_max" => Some(WeatherVariable::TempMax),
            "temp_mean" | "atmp_mean" => Some(WeatherVariable::TempMean),
            "humidity_mean" | "relh_mean" => Some(WeatherVariable::HumidityMean),
            "precipitation" | "pcpn_sum" => Some(WeatherVariable::Precipitation),
            "leaf_wetness" | "lws0_pwet_sum" => Some(WeatherVariable::LeafWetness),
            _ => None,
        }
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherVariable {
    type Err = AgriForecastError;

    fn from_str(s: &str) -> Result<Self> {
        WeatherVariable::from_column_name(s).ok_or_else(|| {
            AgriForecastError::InvalidParameter(format!("Unknown weather variable: '{}'", s))
        })
    }
}

/// Source quality flag carried by each observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    #[default]
    Verified,
    Estimated,
    Suspect,
}

impl FromStr for QualityFlag {
    type Err = AgriForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(QualityFlag::Verified),
            "estimated" => Ok(QualityFlag::Estimated),
            "suspect" => Ok(QualityFlag::Suspect),
            other => Err(AgriForecastError::DataQuality(format!(
                "Unknown quality flag: '{}'",
                other
            ))),
        }
    }
}

/// One quality-checked day of weather measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar date of the measurements
    pub date: NaiveDate,
    /// Variable values present for this day; missing variables are absent keys
    pub values: BTreeMap<WeatherVariable, f64>,
    /// Source quality flag
    pub quality: QualityFlag,
}

impl Observation {
    /// Create an observation with the given values
    pub fn new(date: NaiveDate, values: BTreeMap<WeatherVariable, f64>) -> Self {
        Self {
            date,
            values,
            quality: QualityFlag::default(),
        }
    }

    /// Value of a variable on this day, if measured
    pub fn value(&self, variable: WeatherVariable) -> Option<f64> {
        self.values.get(&variable).copied()
    }
}

/// Dense time series of one variable, with parallel date and value vectors
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    variable: WeatherVariable,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series, validating that dates are strictly increasing
    pub fn new(
        variable: WeatherVariable,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(AgriForecastError::DataQuality(format!(
                "Series '{}' has {} dates but {} values",
                variable,
                dates.len(),
                values.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(AgriForecastError::DataQuality(format!(
                    "Series '{}' dates not strictly increasing at {}",
                    variable, pair[1]
                )));
            }
        }
        Ok(Self {
            variable,
            dates,
            values,
        })
    }

    pub fn variable(&self) -> WeatherVariable {
        self.variable
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Value measured on the given date, if any
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Latest measurement strictly before the given date
    pub fn value_before(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        let idx = self.dates.partition_point(|d| *d < date);
        if idx == 0 {
            None
        } else {
            Some((self.dates[idx - 1], self.values[idx - 1]))
        }
    }

    /// Sub-series with dates in the inclusive range [start, end]
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> DailySeries {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        DailySeries {
            variable: self.variable,
            dates: self.dates[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    /// Sub-series with dates up to and including the given date
    pub fn up_to(&self, end: NaiveDate) -> DailySeries {
        let hi = self.dates.partition_point(|d| *d <= end);
        DailySeries {
            variable: self.variable,
            dates: self.dates[..hi].to_vec(),
            values: self.values[..hi].to_vec(),
        }
    }

    /// Mean of the series values
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(AgriForecastError::InsufficientData(format!(
                "Series '{}' is empty",
                self.variable
            )));
        }
        Ok(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Population standard deviation of the series values
    pub fn std_dev(&self) -> Result<f64> {
        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        Ok(variance.sqrt())
    }
}

/// Owner of the cleaned daily observation table
///
/// Construction enforces the store invariant: dates strictly increasing with
/// no duplicates. Downstream components read series views and never mutate
/// the observations.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    observations: Vec<Observation>,
}

impl ObservationStore {
    /// Create a store from observations, validating date ordering
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for pair in observations.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(AgriForecastError::DataQuality(format!(
                    "Duplicate observation date: {}",
                    pair[1].date
                )));
            }
            if pair[1].date < pair[0].date {
                return Err(AgriForecastError::DataQuality(format!(
                    "Observation dates not increasing at {}",
                    pair[1].date
                )));
            }
        }
        Ok(Self { observations })
    }

    /// Load a cleaned daily observation table from a CSV file
    ///
    /// Expects a `date` column plus any subset of the recognized variable
    /// columns (canonical names or MAWN-style aliases). Numeric cells holding
    /// a designated missing-value marker are treated as absent.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut date_idx = None;
        let mut quality_idx = None;
        let mut variable_columns: Vec<(usize, WeatherVariable)> = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            let lower = name.to_lowercase();
            if lower == "date" {
                date_idx = Some(idx);
            } else if lower == "quality_flag" {
                quality_idx = Some(idx);
            } else if let Some(variable) = WeatherVariable::from_column_name(name) {
                variable_columns.push((idx, variable));
            }
        }

        let date_idx = date_idx.ok_or_else(|| {
            AgriForecastError::DataQuality("No 'date' column found in input table".to_string())
        })?;
        if variable_columns.is_empty() {
            return Err(AgriForecastError::DataQuality(
                "No recognized weather variable columns found in input table".to_string(),
            ));
        }

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw_date = record.get(date_idx).unwrap_or("");
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
                AgriForecastError::DataQuality(format!("Unparseable date: '{}'", raw_date))
            })?;

            let mut values = BTreeMap::new();
            for &(idx, variable) in &variable_columns {
                let cell = record.get(idx).unwrap_or("").trim();
                if MISSING_MARKERS.contains(&cell.to_lowercase().as_str()) {
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| {
                    AgriForecastError::DataQuality(format!(
                        "Unparseable value for '{}' on {}: '{}'",
                        variable, date, cell
                    ))
                })?;
                values.insert(variable, value);
            }

            let mut observation = Observation::new(date, values);
            if let Some(idx) = quality_idx {
                let cell = record.get(idx).unwrap_or("").trim();
                if !cell.is_empty() {
                    observation.quality = cell.parse()?;
                }
            }
            observations.push(observation);
        }

        Self::new(observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Dense series for one variable, skipping days where it is missing
    pub fn series(&self, variable: WeatherVariable) -> Result<DailySeries> {
        let mut dates = Vec::new();
        let mut values = Vec::new();
        for observation in &self.observations {
            if let Some(value) = observation.value(variable) {
                dates.push(observation.date);
                values.push(value);
            }
        }
        DailySeries::new(variable, dates, values)
    }

    /// Fraction of observation days carrying the given variable
    pub fn completeness(&self, variable: WeatherVariable) -> f64 {
        if self.observations.is_empty() {
            return 0.0;
        }
        let present = self
            .observations
            .iter()
            .filter(|o| o.value(variable).is_some())
            .count();
        present as f64 / self.observations.len() as f64
    }

    /// Growing degree days above the given base temperature, per day
    ///
    /// Derived feature for downstream consumers; not a forecasting input.
    pub fn growing_degree_days(&self, base: f64) -> Vec<(NaiveDate, f64)> {
        self.observations
            .iter()
            .filter_map(|o| {
                o.value(WeatherVariable::TempMean)
                    .map(|t| (o.date, (t - base).max(0.0)))
            })
            .collect()
    }

    /// Daily temperature range (max minus min), per day
    pub fn temperature_range(&self) -> Vec<(NaiveDate, f64)> {
        self.observations
            .iter()
            .filter_map(|o| {
                match (
                    o.value(WeatherVariable::TempMax),
                    o.value(WeatherVariable::TempMin),
                ) {
                    (Some(max), Some(min)) => Some((o.date, max - min)),
                    _ => None,
                }
            })
            .collect()
    }
}

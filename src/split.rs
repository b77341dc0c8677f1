//! Temporal train/validation/test partitioning
//!
//! Splits are a function of date only, never of observed values, so no future
//! information can influence earlier predictions.

use crate::data::DailySeries;
use crate::error::{AgriForecastError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the three temporal splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitName {
    Train,
    Validation,
    Test,
}

impl SplitName {
    pub const ALL: [SplitName; 3] = [SplitName::Train, SplitName::Validation, SplitName::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Validation => "validation",
            SplitName::Test => "test",
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date boundaries partitioning a series into train/validation/test
///
/// Train covers dates up to and including `train_end`, validation the dates
/// after `train_end` up to and including `validation_end`, test everything
/// later. Validation entirely precedes test by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitBoundaries {
    pub train_end: NaiveDate,
    pub validation_end: NaiveDate,
}

impl SplitBoundaries {
    pub fn new(train_end: NaiveDate, validation_end: NaiveDate) -> Result<Self> {
        if validation_end <= train_end {
            return Err(AgriForecastError::InvalidParameter(format!(
                "validation_end ({}) must be after train_end ({})",
                validation_end, train_end
            )));
        }
        Ok(Self {
            train_end,
            validation_end,
        })
    }

    /// Resolve fractional split sizes to date boundaries for a given series
    ///
    /// The fractions are applied to the observed dates once; the resulting
    /// boundaries are thereafter a pure function of date.
    pub fn from_fractions(
        series: &DailySeries,
        train_fraction: f64,
        validation_fraction: f64,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&train_fraction)
            || !(0.0..1.0).contains(&validation_fraction)
            || train_fraction + validation_fraction >= 1.0
            || train_fraction <= 0.0
            || validation_fraction <= 0.0
        {
            return Err(AgriForecastError::InvalidParameter(format!(
                "Invalid split fractions: train={}, validation={}",
                train_fraction, validation_fraction
            )));
        }
        if series.len() < 3 {
            return Err(AgriForecastError::InsufficientData(format!(
                "Series '{}' has only {} observations; cannot derive split boundaries",
                series.variable(),
                series.len()
            )));
        }
        let n = series.len();
        let train_count = ((n as f64) * train_fraction).round().max(1.0) as usize;
        let validation_count = ((n as f64) * validation_fraction).round().max(1.0) as usize;
        let train_idx = train_count.min(n - 2) - 1;
        let validation_idx = (train_idx + validation_count).min(n - 2);
        Self::new(series.dates()[train_idx], series.dates()[validation_idx])
    }

    /// Split a date falls into
    pub fn split_of(&self, date: NaiveDate) -> SplitName {
        if date <= self.train_end {
            SplitName::Train
        } else if date <= self.validation_end {
            SplitName::Validation
        } else {
            SplitName::Test
        }
    }

    /// First date after the training range
    pub fn validation_start(&self) -> NaiveDate {
        self.train_end + Days::new(1)
    }

    /// First date after the validation range
    pub fn test_start(&self) -> NaiveDate {
        self.validation_end + Days::new(1)
    }

    /// Portion of a series falling in the given split
    pub fn window(&self, series: &DailySeries, split: SplitName) -> DailySeries {
        match split {
            SplitName::Train => series.up_to(self.train_end),
            SplitName::Validation => {
                series.between(self.validation_start(), self.validation_end)
            }
            SplitName::Test => match series.last_date() {
                Some(last) => series.between(self.test_start(), last),
                None => series.clone(),
            },
        }
    }
}

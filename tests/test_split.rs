use agri_forecast::data::{DailySeries, WeatherVariable};
use agri_forecast::split::{SplitBoundaries, SplitName};
use chrono::{Days, NaiveDate};

fn daily_series(start: &str, n: usize) -> DailySeries {
    let start: NaiveDate = start.parse().unwrap();
    let dates: Vec<NaiveDate> = (0..n as u64).map(|i| start + Days::new(i)).collect();
    let values: Vec<f64> = (0..n).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();
    DailySeries::new(WeatherVariable::TempMean, dates, values).unwrap()
}

#[test]
fn test_boundaries_validation() {
    let train_end: NaiveDate = "2023-06-01".parse().unwrap();
    assert!(SplitBoundaries::new(train_end, "2023-07-01".parse().unwrap()).is_ok());
    assert!(SplitBoundaries::new(train_end, train_end).is_err());
    assert!(SplitBoundaries::new(train_end, "2023-05-01".parse().unwrap()).is_err());
}

#[test]
fn test_from_fractions_rejects_bad_fractions() {
    let series = daily_series("2023-01-01", 100);
    assert!(SplitBoundaries::from_fractions(&series, 0.0, 0.15).is_err());
    assert!(SplitBoundaries::from_fractions(&series, 0.9, 0.2).is_err());
    assert!(SplitBoundaries::from_fractions(&series, -0.1, 0.15).is_err());
}

#[test]
fn test_windows_partition_the_series() {
    let series = daily_series("2023-01-01", 100);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.7, 0.15).unwrap();

    let train = boundaries.window(&series, SplitName::Train);
    let validation = boundaries.window(&series, SplitName::Validation);
    let test = boundaries.window(&series, SplitName::Test);

    // Every observation lands in exactly one split
    assert_eq!(train.len() + validation.len() + test.len(), series.len());
    assert_eq!(train.len(), 70);
    assert_eq!(validation.len(), 15);
    assert_eq!(test.len(), 15);

    // Temporal ordering: train < validation < test, with no overlap
    assert!(train.last_date().unwrap() < validation.first_date().unwrap());
    assert!(validation.last_date().unwrap() < test.first_date().unwrap());
    assert_eq!(test.last_date(), series.last_date());
}

#[test]
fn test_split_of_matches_windows() {
    let series = daily_series("2023-01-01", 60);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.6, 0.2).unwrap();

    for split in SplitName::ALL {
        let window = boundaries.window(&series, split);
        for &d in window.dates() {
            assert_eq!(boundaries.split_of(d), split);
        }
    }
}

#[test]
fn test_boundaries_are_dates_not_indices() {
    // A series with a measurement gap still splits purely by date
    let start: NaiveDate = "2023-01-01".parse().unwrap();
    let dates: Vec<NaiveDate> = (0..40u64)
        .filter(|i| i % 7 != 6)
        .map(|i| start + Days::new(i))
        .collect();
    let values = vec![5.0; dates.len()];
    let sparse = DailySeries::new(WeatherVariable::Precipitation, dates, values).unwrap();

    let boundaries = SplitBoundaries::from_fractions(&sparse, 0.5, 0.25).unwrap();
    let train = boundaries.window(&sparse, SplitName::Train);
    assert!(train.last_date().unwrap() <= boundaries.train_end);
    assert_eq!(boundaries.validation_start(), boundaries.train_end + Days::new(1));
    assert_eq!(boundaries.test_start(), boundaries.validation_end + Days::new(1));
}

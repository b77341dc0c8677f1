use agri_forecast::data::{Observation, ObservationStore, QualityFlag, WeatherVariable};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn observation(s: &str, temp: f64) -> Observation {
    let mut values = BTreeMap::new();
    values.insert(WeatherVariable::TempMean, temp);
    Observation::new(date(s), values)
}

#[test]
fn test_store_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,temp_mean,humidity_mean,precipitation").unwrap();
    writeln!(file, "2023-01-01,4.5,82.0,0.0").unwrap();
    writeln!(file, "2023-01-02,5.1,79.5,3.2").unwrap();
    writeln!(file, "2023-01-03,6.0,88.0,12.4").unwrap();

    let store = ObservationStore::from_csv(file.path()).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.first_date(), Some(date("2023-01-01")));
    assert_eq!(store.last_date(), Some(date("2023-01-03")));

    let series = store.series(WeatherVariable::TempMean).unwrap();
    assert_eq!(series.values(), &[4.5, 5.1, 6.0]);
}

#[test]
fn test_store_from_csv_with_station_aliases() {
    // Station exports use their own column names
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,atmp_mean,relh_mean,pcpn_sum,lws0_pwet_sum").unwrap();
    writeln!(file, "2023-06-01,18.2,71.0,0.0,120.0").unwrap();
    writeln!(file, "2023-06-02,19.5,68.0,1.1,95.0").unwrap();

    let store = ObservationStore::from_csv(file.path()).unwrap();
    assert_eq!(store.len(), 2);
    let first = &store.observations()[0];
    assert_eq!(first.value(WeatherVariable::TempMean), Some(18.2));
    assert_eq!(first.value(WeatherVariable::HumidityMean), Some(71.0));
    assert_eq!(first.value(WeatherVariable::LeafWetness), Some(120.0));
}

#[test]
fn test_store_from_csv_missing_markers() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,temp_mean,precipitation").unwrap();
    writeln!(file, "2023-01-01,4.5,NA").unwrap();
    writeln!(file, "2023-01-02,-99,0.4").unwrap();
    writeln!(file, "2023-01-03,,1.0").unwrap();
    writeln!(file, "2023-01-04,7.2,-999").unwrap();

    let store = ObservationStore::from_csv(file.path()).unwrap();
    assert_eq!(store.len(), 4);

    // Missing cells become absent values, not zeros
    let temps = store.series(WeatherVariable::TempMean).unwrap();
    assert_eq!(temps.len(), 2);
    assert_eq!(temps.values(), &[4.5, 7.2]);

    assert_eq!(store.completeness(WeatherVariable::TempMean), 0.5);
    assert_eq!(store.completeness(WeatherVariable::Precipitation), 0.75);
    assert_eq!(store.completeness(WeatherVariable::HumidityMean), 0.0);
}

#[test]
fn test_store_from_csv_quality_flags() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,temp_mean,quality_flag").unwrap();
    writeln!(file, "2023-01-01,4.5,verified").unwrap();
    writeln!(file, "2023-01-02,5.0,estimated").unwrap();
    writeln!(file, "2023-01-03,5.5,").unwrap();

    let store = ObservationStore::from_csv(file.path()).unwrap();
    assert_eq!(store.observations()[0].quality, QualityFlag::Verified);
    assert_eq!(store.observations()[1].quality, QualityFlag::Estimated);
    assert_eq!(store.observations()[2].quality, QualityFlag::Verified);
}

#[test]
fn test_store_from_csv_error_handling() {
    let result = ObservationStore::from_csv("no_such_file.csv");
    assert!(result.is_err());

    // No recognized variable columns
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,wind_speed").unwrap();
    writeln!(file, "2023-01-01,4.0").unwrap();
    assert!(ObservationStore::from_csv(file.path()).is_err());

    // No date column
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "temp_mean").unwrap();
    writeln!(file, "4.0").unwrap();
    assert!(ObservationStore::from_csv(file.path()).is_err());

    // Unparseable numeric cell
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,temp_mean").unwrap();
    writeln!(file, "2023-01-01,warm").unwrap();
    assert!(ObservationStore::from_csv(file.path()).is_err());
}

#[test]
fn test_store_rejects_duplicate_and_unordered_dates() {
    let result = ObservationStore::new(vec![
        observation("2023-01-01", 4.0),
        observation("2023-01-01", 5.0),
    ]);
    assert!(result.is_err());

    let result = ObservationStore::new(vec![
        observation("2023-01-02", 4.0),
        observation("2023-01-01", 5.0),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_series_operations() {
    let store = ObservationStore::new(vec![
        observation("2023-01-01", 4.0),
        observation("2023-01-02", 6.0),
        observation("2023-01-04", 8.0),
    ])
    .unwrap();
    let series = store.series(WeatherVariable::TempMean).unwrap();

    assert_eq!(series.value_on(date("2023-01-02")), Some(6.0));
    assert_eq!(series.value_on(date("2023-01-03")), None);

    // value_before skips the gap and reads the latest earlier measurement
    assert_eq!(
        series.value_before(date("2023-01-04")),
        Some((date("2023-01-02"), 6.0))
    );
    assert_eq!(series.value_before(date("2023-01-01")), None);

    let subset = series.between(date("2023-01-02"), date("2023-01-04"));
    assert_eq!(subset.len(), 2);
    let head = series.up_to(date("2023-01-02"));
    assert_eq!(head.values(), &[4.0, 6.0]);

    assert_eq!(series.mean().unwrap(), 6.0);
    assert!(series.std_dev().unwrap() > 1.6);
}

#[test]
fn test_derived_features() {
    let mut values = BTreeMap::new();
    values.insert(WeatherVariable::TempMean, 14.0);
    values.insert(WeatherVariable::TempMin, 8.0);
    values.insert(WeatherVariable::TempMax, 21.0);
    let store = ObservationStore::new(vec![
        Observation::new(date("2023-05-01"), values),
        observation("2023-05-02", 7.0),
    ])
    .unwrap();

    let gdd = store.growing_degree_days(10.0);
    assert_eq!(gdd.len(), 2);
    assert_eq!(gdd[0].1, 4.0);
    // Below the base temperature the crop accumulates nothing
    assert_eq!(gdd[1].1, 0.0);

    let range = store.temperature_range();
    assert_eq!(range.len(), 1);
    assert_eq!(range[0], (date("2023-05-01"), 13.0));
}

#[test]
fn test_weather_variable_parsing() {
    assert_eq!(
        "temp_mean".parse::<WeatherVariable>().unwrap(),
        WeatherVariable::TempMean
    );
    assert_eq!(
        "RELH_MEAN".parse::<WeatherVariable>().unwrap(),
        WeatherVariable::HumidityMean
    );
    assert!("wind_speed".parse::<WeatherVariable>().is_err());
}

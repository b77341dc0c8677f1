use agri_forecast::data::{DailySeries, WeatherVariable};
use agri_forecast::forecast;
use agri_forecast::models::{
    Autoregressive, ForecastModel, ModelId, Persistence, SeasonalTrend,
};
use agri_forecast::split::SplitBoundaries;
use assert_approx_eq::assert_approx_eq;
use chrono::{Days, NaiveDate};

fn ramp_series(n: usize) -> DailySeries {
    let start: NaiveDate = "2022-01-01".parse().unwrap();
    let dates: Vec<NaiveDate> = (0..n as u64).map(|i| start + Days::new(i)).collect();
    let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
    DailySeries::new(WeatherVariable::TempMean, dates, values).unwrap()
}

fn candidates() -> Vec<Box<dyn ForecastModel>> {
    vec![
        Box::new(Persistence::new()),
        Box::new(Autoregressive::new(5, 1).unwrap()),
        Box::new(SeasonalTrend::new(5, 0.95).unwrap()),
    ]
}

#[test]
fn test_horizon_starts_after_last_observation() {
    let series = ramp_series(240);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.7, 0.15).unwrap();
    let last = series.last_date().unwrap();

    let forecast = forecast::generate(
        &series,
        &boundaries,
        ModelId::Persistence,
        &candidates(),
        14,
        last,
    )
    .unwrap();

    // The horizon follows the newest observation, not the validation cut
    assert_eq!(forecast.horizon_len(), 14);
    assert_eq!(forecast.points[0].date, last + Days::new(1));
    assert!(forecast.points[0].date > boundaries.test_start());
    assert_eq!(
        forecast.points.last().unwrap().date,
        last + Days::new(14)
    );
}

#[test]
fn test_persistence_horizon_carries_newest_value() {
    let series = ramp_series(240);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.7, 0.15).unwrap();

    let forecast = forecast::generate(
        &series,
        &boundaries,
        ModelId::Persistence,
        &candidates(),
        7,
        series.last_date().unwrap(),
    )
    .unwrap();

    // The persisted value is the last observation of the whole series, not
    // the last value the model was fit on
    for point in &forecast.points {
        assert_eq!(point.point, 239.0);
    }
}

#[test]
fn test_recursive_forecast_seeds_from_latest_observations() {
    // A pure ramp: first differences are a constant 1, so the fitted model
    // extends the line one unit per day from wherever the data ends
    let series = ramp_series(240);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.7, 0.15).unwrap();

    let forecast = forecast::generate(
        &series,
        &boundaries,
        ModelId::Autoregressive,
        &candidates(),
        10,
        series.last_date().unwrap(),
    )
    .unwrap();

    for (i, point) in forecast.points.iter().enumerate() {
        assert_approx_eq!(point.point, 240.0 + i as f64, 1e-6);
    }
}

#[test]
fn test_selected_model_must_be_a_candidate() {
    let series = ramp_series(120);
    let boundaries = SplitBoundaries::from_fractions(&series, 0.7, 0.15).unwrap();

    let thin: Vec<Box<dyn ForecastModel>> = vec![Box::new(Persistence::new())];
    let result = forecast::generate(
        &series,
        &boundaries,
        ModelId::SeasonalTrend,
        &thin,
        14,
        series.last_date().unwrap(),
    );
    assert!(result.is_err());
}

use agri_forecast::data::{DailySeries, WeatherVariable};
use agri_forecast::models::{
    Autoregressive, ForecastModel, ModelId, Persistence, SeasonalTrend,
};
use assert_approx_eq::assert_approx_eq;
use chrono::{Days, NaiveDate};

fn series_from(start: &str, values: Vec<f64>) -> DailySeries {
    let start: NaiveDate = start.parse().unwrap();
    let dates: Vec<NaiveDate> = (0..values.len() as u64)
        .map(|i| start + Days::new(i))
        .collect();
    DailySeries::new(WeatherVariable::TempMean, dates, values).unwrap()
}

fn horizon(after: &DailySeries, n: u64) -> Vec<NaiveDate> {
    let last = after.last_date().unwrap();
    (1..=n).map(|i| last + Days::new(i)).collect()
}

#[test]
fn test_persistence_forecast_is_flat() {
    let train = series_from("2023-01-01", vec![4.0, 5.0, 6.5]);
    let trained = Persistence::new().fit(&train).unwrap();

    let points = trained.forecast(&horizon(&train, 3)).unwrap();
    assert_eq!(points.len(), 3);
    for point in &points {
        assert_eq!(point.point, 6.5);
        // No native uncertainty band: degenerate bounds
        assert_eq!(point.lower, 6.5);
        assert_eq!(point.upper, 6.5);
    }
}

#[test]
fn test_persistence_predicts_previous_observation() {
    let values = vec![4.0, 5.0, 6.5, 3.0, 8.0];
    let series = series_from("2023-01-01", values.clone());
    let trained = Persistence::new().fit(&series.up_to("2023-01-02".parse().unwrap())).unwrap();

    // One-step-ahead prediction for day t is exactly the observation at t-1
    for i in 1..values.len() {
        let date = series.dates()[i];
        let points = trained.predict(&series, &[date]).unwrap();
        assert_eq!(points[0].point, values[i - 1]);
    }

    // No history before the first date
    assert!(trained.predict(&series, &[series.dates()[0]]).is_err());
}

#[test]
fn test_persistence_rejects_empty_train() {
    let empty = series_from("2023-01-01", vec![]);
    assert!(Persistence::new().fit(&empty).is_err());
}

#[test]
fn test_autoregressive_parameter_validation() {
    assert!(Autoregressive::new(0, 0).is_err());
    assert!(Autoregressive::new(3, 2).is_err());
    assert!(Autoregressive::new(3, 1).is_ok());
}

#[test]
fn test_autoregressive_needs_enough_history() {
    let short = series_from("2023-01-01", vec![5.0, 5.2, 5.1]);
    let model = Autoregressive::new(5, 1).unwrap();
    assert!(model.fit(&short).is_err());
}

#[test]
fn test_autoregressive_constant_series_falls_back_to_mean() {
    let train = series_from("2023-01-01", vec![7.0; 60]);
    let model = Autoregressive::new(5, 1).unwrap();
    let trained = model.fit(&train).unwrap();

    let points = trained.forecast(&horizon(&train, 5)).unwrap();
    for point in &points {
        assert_approx_eq!(point.point, 7.0);
    }
}

#[test]
fn test_autoregressive_tracks_ar1_process() {
    // Deterministic AR(1)-style mean reversion around 10
    let mut values = vec![16.0];
    for i in 1..120 {
        let prev = values[i - 1];
        values.push(10.0 + 0.8 * (prev - 10.0) + 0.3 * (i as f64 * 0.7).sin());
    }
    let train = series_from("2023-01-01", values);
    let model = Autoregressive::new(5, 1).unwrap();
    let trained = model.fit(&train).unwrap();

    let points = trained.forecast(&horizon(&train, 10)).unwrap();
    assert_eq!(points.len(), 10);
    // Long-horizon forecasts decay toward the series mean
    for point in &points {
        assert!(point.point > 5.0 && point.point < 15.0);
    }

    // One-step prediction reads only values strictly before each date
    let mid = train.dates()[60];
    let predicted = trained.predict(&train, &[mid]).unwrap();
    assert!((predicted[0].point - train.values()[60]).abs() < 2.0);
}

#[test]
fn test_autoregressive_predict_requires_warmup() {
    let train = series_from("2023-01-01", (0..80).map(|i| (i as f64 * 0.3).sin()).collect());
    let model = Autoregressive::new(5, 0).unwrap();
    let trained = model.fit(&train).unwrap();

    // The very first date has no prior values to regress on
    let first = train.dates()[0];
    assert!(trained.predict(&train, &[first]).is_err());
}

#[test]
fn test_autoregressive_reduced_search_space() {
    let model = Autoregressive::new(5, 1).unwrap();
    let reduced = model.reduced().unwrap();
    assert_eq!(reduced.id(), ModelId::Autoregressive);
    assert!(reduced.name().contains("max_p=2"));

    // Order 1 has nowhere left to shrink
    let minimal = Autoregressive::new(1, 0).unwrap();
    assert!(minimal.reduced().is_none());
}

#[test]
fn test_seasonal_trend_parameter_validation() {
    assert!(SeasonalTrend::new(5, 0.95).is_ok());
    assert!(SeasonalTrend::new(5, 0.0).is_err());
    assert!(SeasonalTrend::new(5, 1.0).is_err());
}

#[test]
fn test_seasonal_trend_recovers_yearly_cycle() {
    // Two years of a clean yearly cycle plus a mild trend
    let values: Vec<f64> = (0..730)
        .map(|i| {
            let t = i as f64;
            12.0 + 0.002 * t + 9.0 * (2.0 * std::f64::consts::PI * t / 365.25).sin()
        })
        .collect();
    let train = series_from("2021-01-01", values);
    let model = SeasonalTrend::new(5, 0.95).unwrap();
    let trained = model.fit(&train).unwrap();

    let points = trained.forecast(&horizon(&train, 30)).unwrap();
    assert_eq!(points.len(), 30);
    for (i, point) in points.iter().enumerate() {
        let t = 730.0 + i as f64;
        let expected = 12.0 + 0.002 * t + 9.0 * (2.0 * std::f64::consts::PI * t / 365.25).sin();
        assert!(
            (point.point - expected).abs() < 1.5,
            "day {}: forecast {} vs expected {}",
            i,
            point.point,
            expected
        );
        // Bands bracket the point estimate
        assert!(point.lower <= point.point && point.point <= point.upper);
    }
}

#[test]
fn test_seasonal_trend_band_width_follows_confidence() {
    let values: Vec<f64> = (0..400)
        .map(|i| 10.0 + 5.0 * (i as f64 * 0.017).sin() + ((i * 7) % 13) as f64 * 0.1)
        .collect();
    let train = series_from("2022-01-01", values);
    let dates = horizon(&train, 5);

    let narrow = SeasonalTrend::new(3, 0.5).unwrap().fit(&train).unwrap();
    let wide = SeasonalTrend::new(3, 0.99).unwrap().fit(&train).unwrap();

    let narrow_points = narrow.forecast(&dates).unwrap();
    let wide_points = wide.forecast(&dates).unwrap();
    for (n, w) in narrow_points.iter().zip(wide_points.iter()) {
        assert!(w.upper - w.lower > n.upper - n.lower);
    }
}

#[test]
fn test_seasonal_trend_needs_enough_history() {
    let short = series_from("2023-01-01", (0..20).map(|i| i as f64).collect());
    let model = SeasonalTrend::new(5, 0.95).unwrap();
    assert!(model.fit(&short).is_err());
}

#[test]
fn test_seasonal_trend_reduced_drops_changepoints() {
    let model = SeasonalTrend::new(5, 0.95).unwrap();
    let reduced = model.reduced().unwrap();
    assert_eq!(reduced.id(), ModelId::SeasonalTrend);

    let flat = SeasonalTrend::new(0, 0.95).unwrap();
    assert!(flat.reduced().is_none());
}

#[test]
fn test_model_id_simplicity_ordering() {
    assert!(ModelId::Persistence < ModelId::Autoregressive);
    assert!(ModelId::Autoregressive < ModelId::SeasonalTrend);
}

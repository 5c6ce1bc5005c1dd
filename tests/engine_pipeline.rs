use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use congestion_forecast::config::{ENGINE, PERSISTENCE, RiskThresholds};
use congestion_forecast::data::save_artifact;
use congestion_forecast::models::{
    ArtifactFile, FeatureMatrix, FeatureSchema, LinearModel, ModelSpec, Regressor,
};
use congestion_forecast::{
    EngineError, Location, ModelArtifact, PredictionEngine, SharedEngine, WeatherProvider,
    WeatherSnapshot,
};

fn at(day: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn write_demo_artifact(dir: &std::path::Path) -> std::path::PathBuf {
    let schema = FeatureSchema::canonical();
    let weights: Vec<f64> = schema
        .names()
        .iter()
        .map(|n| match n.as_str() {
            "is_weekend" => -0.15,
            "precipitation" => 0.02,
            _ => 0.0,
        })
        .collect();
    let file = ArtifactFile {
        version: PERSISTENCE.version,
        feature_schema: schema.names().to_vec(),
        risk_thresholds: Some(RiskThresholds::DEFAULT),
        model: ModelSpec::Linear(LinearModel::new(0.45, weights)),
    };
    let path = dir.join("model.json");
    save_artifact(&path, &file).unwrap();
    path
}

#[tokio::test]
async fn artifact_on_disk_serves_forecasts() {
    let dir = tempfile::tempdir().unwrap();
    let shared = SharedEngine::from_artifact_path(write_demo_artifact(dir.path()), ENGINE.clone(), None);
    assert!(!shared.status().model_loaded);

    let engine = shared.get().unwrap();
    assert_eq!(shared.status().features_count, 35);
    assert_eq!(engine.model_type(), "linear");

    // Tuesday vs Saturday, neutral weather
    let weekday = engine
        .predict_single(Location::new(40.71, -74.0).unwrap(), at(12, 12), None)
        .await
        .unwrap();
    let weekend = engine
        .predict_single(Location::new(40.71, -74.0).unwrap(), at(16, 12), None)
        .await
        .unwrap();
    assert_eq!(weekday.congestion_score, 0.45);
    assert_eq!(weekend.congestion_score, 0.3);
    assert_eq!(weekday.attribution_factors.len(), 5);

    let json = serde_json::to_value(&weekday).unwrap();
    assert_eq!(json["risk_level"], "low");
    assert_eq!(json["timestamp"], "2024-03-12T12:00:00");
}

#[test]
fn batch_keeps_input_order_around_bad_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let shared = SharedEngine::from_artifact_path(write_demo_artifact(dir.path()), ENGINE.clone(), None);
    let engine = shared.get().unwrap();

    let locations = [
        Location::new(37.77, -122.42).unwrap(),
        Location {
            latitude: 12.0,
            longitude: 200.0,
        },
        Location::new(51.5, -0.12).unwrap(),
    ];
    let items = engine.predict_batch(&locations, at(12, 9));

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].prediction().unwrap().location.latitude, 37.77);
    let failed = items[1].failure().unwrap();
    assert!(matches!(failed.cause, EngineError::InvalidCoordinate { .. }));
    assert_eq!(failed.location.longitude, 200.0);
    assert_eq!(items[2].prediction().unwrap().location.latitude, 51.5);

    let json = serde_json::to_value(&items).unwrap();
    assert!(json[1]["error"].as_str().unwrap().contains("200"));
}

#[test]
fn missing_artifact_reports_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let shared = SharedEngine::from_artifact_path(dir.path().join("absent.json"), ENGINE.clone(), None);
    assert!(matches!(shared.get(), Err(EngineError::ModelNotLoaded(_))));
    assert!(!shared.status().model_loaded);
    assert_eq!(shared.status().features_count, 0);
}

struct CountingWeather {
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherProvider for CountingWeather {
    async fn fetch(&self, _location: Location) -> anyhow::Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(WeatherSnapshot {
            precipitation: 10.0,
            ..WeatherSnapshot::NEUTRAL
        })
    }
}

#[tokio::test]
async fn provider_is_consulted_once_per_cached_location() {
    let dir = tempfile::tempdir().unwrap();
    let weather = Arc::new(CountingWeather {
        calls: AtomicUsize::new(0),
    });
    let shared = SharedEngine::from_artifact_path(
        write_demo_artifact(dir.path()),
        ENGINE.clone(),
        Some(weather.clone() as Arc<dyn WeatherProvider>),
    );
    let engine = shared.get().unwrap();

    let loc = Location::new(47.61, -122.33).unwrap();
    let first = engine.predict_single(loc, at(12, 12), None).await.unwrap();
    let second = engine.predict_single(loc, at(12, 15), None).await.unwrap();
    let series = engine.predict_timeseries(loc, at(12, 0), 24).await.unwrap();

    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.congestion_score, 0.65);
    assert_eq!(second.congestion_score, 0.65);
    assert_eq!(series.len(), 9);

    // Caller-supplied weather bypasses the provider
    let dry = engine
        .predict_single(
            Location::new(25.76, -80.19).unwrap(),
            at(12, 12),
            Some(WeatherSnapshot::NEUTRAL),
        )
        .await
        .unwrap();
    assert_eq!(dry.congestion_score, 0.45);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
}

/// Congestion bottoms out at 10:00.
struct TenOClockValley;

impl Regressor for TenOClockValley {
    fn model_type(&self) -> &str {
        "valley"
    }

    fn predict(&self, matrix: &FeatureMatrix) -> anyhow::Result<Vec<f64>> {
        Ok(matrix.rows().map(|row| (row[0] - 10.0).abs() * 0.1).collect())
    }
}

#[tokio::test]
async fn route_search_moves_departure_into_the_valley() {
    let artifact = ModelArtifact::new(Arc::new(TenOClockValley), vec!["hour".into()]);
    let engine = PredictionEngine::new(artifact, ENGINE.clone()).unwrap();

    let summary = engine
        .simulate_route(
            Location::new(37.7749, -122.4194).unwrap(),
            Location::new(37.8044, -122.2712).unwrap(),
            at(12, 8),
        )
        .await
        .unwrap();

    assert_eq!(summary.waypoints.len(), 11);
    assert_eq!(summary.waypoints[0].eta_minutes, 0);
    assert_eq!(summary.waypoints[10].eta_minutes, 20);
    assert_eq!(summary.waypoints[10].location.latitude, 37.8044);
    assert_eq!(summary.risk.average_congestion, 0.2);
    assert_eq!(summary.risk.predicted_waypoints, 11);

    assert_eq!(summary.optimization.optimal_departure, at(12, 10));
    assert_eq!(summary.optimization.time_shift_hours, 2.0);
    assert_eq!(summary.optimization.potential_savings, "2.0 hours");
}

#[tokio::test]
async fn route_with_invalid_endpoint_is_rejected() {
    let artifact = ModelArtifact::new(Arc::new(TenOClockValley), vec!["hour".into()]);
    let engine = PredictionEngine::new(artifact, ENGINE.clone()).unwrap();
    let err = engine
        .simulate_route(
            Location::new(37.0, -122.0).unwrap(),
            Location {
                latitude: 95.0,
                longitude: 0.0,
            },
            at(12, 8),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCoordinate { .. }));
}

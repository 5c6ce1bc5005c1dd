use anyhow::Result;
use clap::Parser;
use congestion_forecast::config::{PERSISTENCE, RiskThresholds, default_artifact_path};
use congestion_forecast::data::save_artifact;
use congestion_forecast::domain::WeatherSnapshot;
use congestion_forecast::models::{ArtifactFile, FeatureKey, FeatureSchema, LinearModel, ModelSpec};

/// Writes a hand-weighted linear artifact so the engine can run without a trained model.
#[derive(Parser, Debug)]
struct Args {
    /// Output path
    #[arg(long, default_value_t = default_artifact_path())]
    out: String,
}

// (weight, baseline) per feature
fn demo_weight(key: FeatureKey) -> (f64, f64) {
    let neutral = WeatherSnapshot::NEUTRAL;
    match key {
        FeatureKey::IsWeekend => (-0.15, 0.0),
        FeatureKey::IsHoliday => (-0.10, 0.0),
        FeatureKey::HourSin => (-0.10, 0.0),
        FeatureKey::HourCos => (-0.15, 0.0),
        FeatureKey::DowSin => (0.02, 0.0),
        FeatureKey::Temperature => (-0.002, neutral.temperature),
        FeatureKey::Precipitation => (0.02, neutral.precipitation),
        FeatureKey::Visibility => (-0.015, neutral.visibility),
        FeatureKey::WindSpeed => (0.002, neutral.wind_speed),
        FeatureKey::Humidity => (0.001, neutral.humidity),
        FeatureKey::IncidentLag(w) => (0.05 / w as f64, 0.0),
        FeatureKey::CongestionLag(1) => (0.30, 0.0),
        FeatureKey::CongestionLag(w) => (0.10 / w as f64, 0.0),
        FeatureKey::IncidentRollingMean(_) => (0.02, 0.0),
        FeatureKey::IncidentRollingStd(_) => (0.01, 0.0),
        _ => (0.0, 0.0),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let schema = FeatureSchema::canonical();
    let (weights, baseline): (Vec<f64>, Vec<f64>) =
        schema.keys().iter().map(|k| demo_weight(*k)).unzip();

    log::info!("Building demo artifact with {} features", schema.len());

    let artifact = ArtifactFile {
        version: PERSISTENCE.version,
        feature_schema: schema.names().to_vec(),
        risk_thresholds: Some(RiskThresholds::DEFAULT),
        model: ModelSpec::Linear(LinearModel::new(0.45, weights).with_baseline(baseline)),
    };

    save_artifact(&args.out, &artifact)?;
    log::info!("Wrote {}", args.out);
    Ok(())
}

#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries and integration tests)
pub use config::{BatchMode, ENGINE, EngineConfig, RiskLevel, RiskThresholds};
pub use data::{OpenWeatherProvider, WeatherProvider, load_artifact};
pub use domain::{Location, WeatherSnapshot};
pub use engine::{EngineStatus, PredictionEngine, SharedEngine};
pub use error::{EngineError, EngineResult};
pub use models::{ForecastItem, ModelArtifact, PredictionResult, RouteSummary, TimeseriesItem};

// CLI argument parsing
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Model artifact (JSON)
    #[arg(long, default_value_t = config::default_artifact_path())]
    pub artifact: String,

    /// OpenWeather API key. Without one, neutral weather is assumed.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Whether batch results carry factors and recommendations
    #[arg(long, value_enum, default_value_t = BatchMode::Fast)]
    pub batch_mode: BatchMode,

    /// Render time series and routes as tables instead of JSON
    #[arg(long, default_value_t = false, global = true)]
    pub table: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Forecast one location
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Timestamp (RFC 3339 or "YYYY-MM-DD HH:MM"); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Forecast many locations at one time, without live weather
    Batch {
        /// "lat,lon" pairs
        #[arg(long = "point", required = true, allow_hyphen_values = true)]
        points: Vec<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Forecast one location every few hours
    Timeseries {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = config::constants::timeseries::DEFAULT_HOURS_AHEAD,
              value_parser = clap::value_parser!(u32).range(
                  config::constants::timeseries::MIN_HOURS_AHEAD as i64
                      ..=config::constants::timeseries::MAX_HOURS_AHEAD as i64))]
        hours_ahead: u32,
        #[arg(long)]
        start: Option<String>,
    },
    /// Score a straight-line route and search for a better departure time
    Route {
        #[arg(long, allow_hyphen_values = true)]
        start_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        start_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        end_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        end_lon: f64,
        #[arg(long)]
        departure: Option<String>,
    },
    /// Model importances and statistics over sample forecasts
    Insights,
    /// Whether the model loads, without failing when it does not
    Health,
}

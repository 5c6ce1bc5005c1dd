//! Configuration module for the congestion forecast engine.

// Can all be private now because we have a public re-export.
mod debug;
mod demo;
mod forecast;
mod persistence;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use debug::{DF, LogFlags};
pub use demo::{DEMO, SampleLocation};
pub use forecast::{
    ENGINE, EngineConfig, ExplanationSettings, RouteSettings, SpatialSettings,
    TimeseriesSettings, WeatherSettings,
};
pub use persistence::{PERSISTENCE, default_artifact_path};
pub use types::{BatchMode, CongestionScore, RiskLevel, RiskThresholds};

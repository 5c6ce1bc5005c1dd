//! Engine configuration (Immutable Blueprints)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{self, prediction, route, timeseries, weather};
use super::types::{BatchMode, RiskThresholds};

/// Spatial indexing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpatialSettings {
    /// H3 resolution used for `SpatialCell`s
    pub h3_resolution: u8,
}

/// Weather cache and provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherSettings {
    /// Entry is valid iff `now - fetched_at < ttl`
    pub ttl: Duration,
    /// Upper bound on a single provider call
    pub fetch_timeout: Duration,
    /// Coordinate decimals kept in the cache key
    pub key_decimals: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeseriesSettings {
    pub step_hours: u32,
    pub min_hours_ahead: u32,
    pub max_hours_ahead: u32,
    pub default_hours_ahead: u32,
}

/// Route simulation settings.
/// Distance and speed are a placeholder for real routing: every route is treated as the same length.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSettings {
    pub waypoint_count: usize,
    pub assumed_distance_km: f64,
    pub average_speed_kmh: f64,
    /// Departure search covers `-search_window_hours..=search_window_hours`
    pub search_window_hours: i64,
    /// Every n-th waypoint is re-predicted during the departure search
    pub sample_stride: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplanationSettings {
    pub max_factors: usize,
    /// How many rule factors a `PredictionResult` shows
    pub factors_shown: usize,
    pub max_attributions: usize,
    pub max_recommendations: usize,
}

/// The Master Engine Configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub risk_thresholds: RiskThresholds,
    pub confidence: f64,
    pub batch_mode: BatchMode,

    // Sub-groups
    pub spatial: SpatialSettings,
    pub weather: WeatherSettings,
    pub timeseries: TimeseriesSettings,
    pub route: RouteSettings,
    pub explanation: ExplanationSettings,
}

impl EngineConfig {
    /// Same config with the artifact's thresholds taking precedence.
    pub fn with_thresholds(mut self, thresholds: Option<RiskThresholds>) -> Self {
        if let Some(t) = thresholds {
            self.risk_thresholds = t;
        }
        self
    }

    pub fn with_batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        ENGINE.clone()
    }
}

pub const ENGINE: EngineConfig = EngineConfig {
    risk_thresholds: RiskThresholds::DEFAULT,
    confidence: prediction::PLACEHOLDER_CONFIDENCE,
    batch_mode: BatchMode::Fast,
    spatial: SpatialSettings {
        h3_resolution: constants::H3_RESOLUTION,
    },
    weather: WeatherSettings {
        ttl: weather::CACHE_TTL,
        fetch_timeout: weather::FETCH_TIMEOUT,
        key_decimals: weather::KEY_DECIMALS,
    },
    timeseries: TimeseriesSettings {
        step_hours: timeseries::STEP_HOURS,
        min_hours_ahead: timeseries::MIN_HOURS_AHEAD,
        max_hours_ahead: timeseries::MAX_HOURS_AHEAD,
        default_hours_ahead: timeseries::DEFAULT_HOURS_AHEAD,
    },
    route: RouteSettings {
        waypoint_count: route::WAYPOINT_COUNT,
        assumed_distance_km: route::ASSUMED_DISTANCE_KM,
        average_speed_kmh: route::AVERAGE_SPEED_KMH,
        search_window_hours: route::SEARCH_WINDOW_HOURS,
        sample_stride: route::SAMPLE_STRIDE,
    },
    explanation: ExplanationSettings {
        max_factors: prediction::MAX_FACTORS,
        factors_shown: prediction::FACTORS_SHOWN,
        max_attributions: prediction::MAX_ATTRIBUTIONS,
        max_recommendations: prediction::MAX_RECOMMENDATIONS,
    },
};

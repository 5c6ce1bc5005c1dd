use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::constants::weather::{
    DEFAULT_HUMIDITY_PCT, DEFAULT_PRECIPITATION_MM, DEFAULT_TEMPERATURE_C,
    DEFAULT_VISIBILITY_KM, DEFAULT_WIND_SPEED_KMH,
};

/// Weather at a location, already in model units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Celsius
    pub temperature: f64,
    /// mm in the last hour
    pub precipitation: f64,
    /// km
    pub visibility: f64,
    /// km/h
    pub wind_speed: f64,
    /// %
    pub humidity: f64,
    /// When the provider produced this snapshot. `None` for caller-supplied or default weather.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    /// Neutral conditions used whenever live weather is unavailable.
    pub const NEUTRAL: Self = Self {
        temperature: DEFAULT_TEMPERATURE_C,
        precipitation: DEFAULT_PRECIPITATION_MM,
        visibility: DEFAULT_VISIBILITY_KM,
        wind_speed: DEFAULT_WIND_SPEED_KMH,
        humidity: DEFAULT_HUMIDITY_PCT,
        fetched_at: None,
    };

    pub fn stamped(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

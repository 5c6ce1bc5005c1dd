// Top Level Constants
pub const H3_RESOLUTION: u8 = 8; // ~0.7 km² cells
pub const LAG_WINDOWS_H: [u32; 5] = [1, 3, 6, 12, 24];
pub const ROLLING_WINDOWS_H: [u32; 4] = [3, 6, 12, 24];

pub mod weather {
    use std::time::Duration;

    // Neutral values used when no live weather is available
    pub const DEFAULT_TEMPERATURE_C: f64 = 20.0;
    pub const DEFAULT_PRECIPITATION_MM: f64 = 0.0;
    pub const DEFAULT_VISIBILITY_KM: f64 = 10.0;
    pub const DEFAULT_WIND_SPEED_KMH: f64 = 10.0;
    pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

    pub const CACHE_TTL: Duration = Duration::from_secs(3600);
    pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
    /// 2 decimals is roughly a 1.1 km cell at the equator.
    pub const KEY_DECIMALS: u32 = 2;
}

pub mod prediction {
    pub const PLACEHOLDER_CONFIDENCE: f64 = 0.85;
    pub const MAX_FACTORS: usize = 5;
    pub const FACTORS_SHOWN: usize = 3;
    pub const MAX_ATTRIBUTIONS: usize = 5;
    pub const MAX_RECOMMENDATIONS: usize = 5;
}

pub mod timeseries {
    pub const STEP_HOURS: u32 = 3;
    pub const MIN_HOURS_AHEAD: u32 = 3;
    pub const MAX_HOURS_AHEAD: u32 = 168;
    pub const DEFAULT_HOURS_AHEAD: u32 = 72;
}

pub mod route {
    pub const WAYPOINT_COUNT: usize = 10;
    // Placeholder geometry, not real routing
    pub const ASSUMED_DISTANCE_KM: f64 = 20.0;
    pub const AVERAGE_SPEED_KMH: f64 = 60.0;
    pub const SEARCH_WINDOW_HOURS: i64 = 3;
    pub const SAMPLE_STRIDE: usize = 2;
}

pub mod insights {
    pub const HORIZONS_H: &[i64] = &[3, 12, 24, 48, 72];
    pub const MAX_IMPORTANCES: usize = 15;
    pub const MAX_PEAK_HOURS: usize = 5;
}

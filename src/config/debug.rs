//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Log every weather cache hit, miss and refresh.
    pub log_weather_cache: bool,

    /// Log each offset evaluated by the departure search.
    pub log_route_search: bool,

    /// Log batch fallbacks to per-row prediction.
    pub log_batch: bool,

    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    pub log_artifact: bool,
}

pub const DF: LogFlags = LogFlags {
    log_artifact: true,

    log_weather_cache: false,
    log_route_search: false,
    log_batch: true,
    log_performance: false,
};

// Domain types and value objects
mod location;
mod weather;

use std::collections::HashMap;

// Re-export commonly used types to the world
pub use location::{Location, SpatialCell};
pub use weather::WeatherSnapshot;

/// Pre-computed lag/rolling aggregates keyed by feature name, e.g. `incident_lag_3h`.
pub type HistoricalAggregates = HashMap<String, f64>;

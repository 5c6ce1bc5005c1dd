use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::constants::{LAG_WINDOWS_H, ROLLING_WINDOWS_H};
use crate::domain::{HistoricalAggregates, Location, WeatherSnapshot};
use crate::error::{EngineError, EngineResult};

/// Every feature the builder knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Latitude,
    Longitude,
    Hour,
    DayOfWeek,
    DayOfMonth,
    Month,
    IsWeekend,
    IsHoliday,
    HourSin,
    HourCos,
    DowSin,
    DowCos,
    Temperature,
    Precipitation,
    Visibility,
    WindSpeed,
    Humidity,
    IncidentLag(u32),
    CongestionLag(u32),
    IncidentRollingMean(u32),
    IncidentRollingStd(u32),
}

const FIXED_KEYS: [(FeatureKey, &str); 17] = [
    (FeatureKey::Latitude, "latitude"),
    (FeatureKey::Longitude, "longitude"),
    (FeatureKey::Hour, "hour"),
    (FeatureKey::DayOfWeek, "day_of_week"),
    (FeatureKey::DayOfMonth, "day_of_month"),
    (FeatureKey::Month, "month"),
    (FeatureKey::IsWeekend, "is_weekend"),
    (FeatureKey::IsHoliday, "is_holiday"),
    (FeatureKey::HourSin, "hour_sin"),
    (FeatureKey::HourCos, "hour_cos"),
    (FeatureKey::DowSin, "dow_sin"),
    (FeatureKey::DowCos, "dow_cos"),
    (FeatureKey::Temperature, "temperature"),
    (FeatureKey::Precipitation, "precipitation"),
    (FeatureKey::Visibility, "visibility"),
    (FeatureKey::WindSpeed, "wind_speed"),
    (FeatureKey::Humidity, "humidity"),
];

impl FeatureKey {
    /// The order a freshly trained model records its features in.
    pub fn canonical() -> Vec<FeatureKey> {
        let mut keys: Vec<FeatureKey> = FIXED_KEYS.iter().map(|(k, _)| *k).collect();
        for w in LAG_WINDOWS_H {
            keys.push(FeatureKey::IncidentLag(w));
            keys.push(FeatureKey::CongestionLag(w));
        }
        for w in ROLLING_WINDOWS_H {
            keys.push(FeatureKey::IncidentRollingMean(w));
            keys.push(FeatureKey::IncidentRollingStd(w));
        }
        keys
    }

    /// Lag and rolling keys, the ones fed from historical aggregates.
    pub fn is_historical(&self) -> bool {
        matches!(
            self,
            FeatureKey::IncidentLag(_)
                | FeatureKey::CongestionLag(_)
                | FeatureKey::IncidentRollingMean(_)
                | FeatureKey::IncidentRollingStd(_)
        )
    }

    fn parse_window(name: &str, prefix: &str, allowed: &[u32]) -> Option<u32> {
        let window = name
            .strip_prefix(prefix)?
            .strip_suffix('h')?
            .parse::<u32>()
            .ok()?;
        allowed.contains(&window).then_some(window)
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FeatureKey::IncidentLag(w) => write!(f, "incident_lag_{}h", w),
            FeatureKey::CongestionLag(w) => write!(f, "congestion_lag_{}h", w),
            FeatureKey::IncidentRollingMean(w) => write!(f, "incident_rolling_mean_{}h", w),
            FeatureKey::IncidentRollingStd(w) => write!(f, "incident_rolling_std_{}h", w),
            fixed => {
                let name = FIXED_KEYS
                    .iter()
                    .find(|(k, _)| k == fixed)
                    .map(|(_, n)| *n)
                    .unwrap_or("unknown");
                write!(f, "{}", name)
            }
        }
    }
}

impl FromStr for FeatureKey {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if let Some((key, _)) = FIXED_KEYS.iter().find(|(_, n)| *n == name) {
            return Ok(*key);
        }

        let parsed = Self::parse_window(name, "incident_lag_", &LAG_WINDOWS_H)
            .map(FeatureKey::IncidentLag)
            .or_else(|| {
                Self::parse_window(name, "congestion_lag_", &LAG_WINDOWS_H)
                    .map(FeatureKey::CongestionLag)
            })
            .or_else(|| {
                Self::parse_window(name, "incident_rolling_mean_", &ROLLING_WINDOWS_H)
                    .map(FeatureKey::IncidentRollingMean)
            })
            .or_else(|| {
                Self::parse_window(name, "incident_rolling_std_", &ROLLING_WINDOWS_H)
                    .map(FeatureKey::IncidentRollingStd)
            });

        parsed.ok_or_else(|| {
            EngineError::InvalidFeatureSchema(format!("model expects unknown feature '{}'", name))
        })
    }
}

/// The model's trained feature order, resolved to typed keys once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    keys: Vec<FeatureKey>,
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> EngineResult<Self> {
        if names.is_empty() {
            return Err(EngineError::InvalidFeatureSchema(
                "model declares an empty feature schema".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(EngineError::InvalidFeatureSchema(format!(
                    "feature '{}' appears twice",
                    name
                )));
            }
            keys.push(name.parse::<FeatureKey>()?);
        }

        Ok(Self {
            keys,
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
        })
    }

    pub fn canonical() -> Self {
        let keys = FeatureKey::canonical();
        let names = keys.iter().map(|k| k.to_string()).collect();
        Self { keys, names }
    }

    pub fn keys(&self) -> &[FeatureKey] {
        &self.keys
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Calendar and cyclical features of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeFeatures {
    pub hour: u32,
    /// Monday = 0
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub dow_sin: f64,
    pub dow_cos: f64,
}

/// Lag and rolling aggregates, zero where nothing was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryFeatures {
    incident_lag: [f64; LAG_WINDOWS_H.len()],
    congestion_lag: [f64; LAG_WINDOWS_H.len()],
    rolling_mean: [f64; ROLLING_WINDOWS_H.len()],
    rolling_std: [f64; ROLLING_WINDOWS_H.len()],
}

impl HistoryFeatures {
    /// Picks the known lag/rolling keys out of `aggregates`; anything else in the map is ignored.
    pub fn from_aggregates(aggregates: Option<&HistoricalAggregates>) -> Self {
        let Some(map) = aggregates else {
            return Self::default();
        };

        let lookup = |key: FeatureKey| map.get(&key.to_string()).copied().unwrap_or(0.0);

        let mut history = Self::default();
        for (i, w) in LAG_WINDOWS_H.iter().enumerate() {
            history.incident_lag[i] = lookup(FeatureKey::IncidentLag(*w));
            history.congestion_lag[i] = lookup(FeatureKey::CongestionLag(*w));
        }
        for (i, w) in ROLLING_WINDOWS_H.iter().enumerate() {
            history.rolling_mean[i] = lookup(FeatureKey::IncidentRollingMean(*w));
            history.rolling_std[i] = lookup(FeatureKey::IncidentRollingStd(*w));
        }
        history
    }

    fn get(&self, key: FeatureKey) -> f64 {
        let lag_idx = |w: u32| LAG_WINDOWS_H.iter().position(|x| *x == w);
        let roll_idx = |w: u32| ROLLING_WINDOWS_H.iter().position(|x| *x == w);
        match key {
            FeatureKey::IncidentLag(w) => lag_idx(w).map(|i| self.incident_lag[i]),
            FeatureKey::CongestionLag(w) => lag_idx(w).map(|i| self.congestion_lag[i]),
            FeatureKey::IncidentRollingMean(w) => roll_idx(w).map(|i| self.rolling_mean[i]),
            FeatureKey::IncidentRollingStd(w) => roll_idx(w).map(|i| self.rolling_std[i]),
            _ => None,
        }
        .unwrap_or(0.0)
    }
}

/// The full typed feature record for one (location, time) pair.
/// Rules read this; the model reads its projection onto the schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    pub location: Location,
    pub time: TimeFeatures,
    pub weather: WeatherSnapshot,
    pub history: HistoryFeatures,
}

impl FeatureRecord {
    pub fn value(&self, key: FeatureKey) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match key {
            FeatureKey::Latitude => self.location.latitude,
            FeatureKey::Longitude => self.location.longitude,
            FeatureKey::Hour => self.time.hour as f64,
            FeatureKey::DayOfWeek => self.time.day_of_week as f64,
            FeatureKey::DayOfMonth => self.time.day_of_month as f64,
            FeatureKey::Month => self.time.month as f64,
            FeatureKey::IsWeekend => flag(self.time.is_weekend),
            FeatureKey::IsHoliday => flag(self.time.is_holiday),
            FeatureKey::HourSin => self.time.hour_sin,
            FeatureKey::HourCos => self.time.hour_cos,
            FeatureKey::DowSin => self.time.dow_sin,
            FeatureKey::DowCos => self.time.dow_cos,
            FeatureKey::Temperature => self.weather.temperature,
            FeatureKey::Precipitation => self.weather.precipitation,
            FeatureKey::Visibility => self.weather.visibility,
            FeatureKey::WindSpeed => self.weather.wind_speed,
            FeatureKey::Humidity => self.weather.humidity,
            historical => self.history.get(historical),
        }
    }

    /// Projects onto the schema, in schema order. Features outside the schema are dropped.
    pub fn project(&self, schema: &Arc<FeatureSchema>) -> FeatureVector {
        FeatureVector {
            schema: Arc::clone(schema),
            values: schema.keys().iter().map(|k| self.value(*k)).collect(),
        }
    }
}

/// One model input row, aligned with the schema it was projected through.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema
            .names()
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row-major block of feature rows sharing one width.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            data: Vec::new(),
        }
    }

    pub fn from_vectors<'a>(
        width: usize,
        rows: impl IntoIterator<Item = &'a FeatureVector>,
    ) -> EngineResult<Self> {
        let mut matrix = Self::with_width(width);
        for row in rows {
            matrix.push_row(row.values())?;
        }
        Ok(matrix)
    }

    /// Appends one row; the matrix is left untouched when the width differs.
    pub fn push_row(&mut self, row: &[f64]) -> EngineResult<()> {
        if row.len() != self.width {
            return Err(EngineError::InvalidFeatureSchema(format!(
                "feature row of width {} (expected {})",
                row.len(),
                self.width
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        if self.width == 0 { 0 } else { self.data.len() / self.width }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.width.max(1))
    }
}

use chrono::{Datelike, NaiveDateTime, Timelike};
use h3o::{LatLng, Resolution};

use crate::config::constants::H3_RESOLUTION;
use crate::domain::{Location, SpatialCell};
use crate::error::{EngineError, EngineResult};
use crate::models::TimeFeatures;
use crate::utils::{TimeUtils, cyclical};

use super::holidays::is_us_federal_holiday;

/// Maps coordinates onto H3 cells and timestamps onto calendar features.
#[derive(Debug, Clone, Copy)]
pub struct SpatialTemporalEncoder {
    resolution: Resolution,
}

impl Default for SpatialTemporalEncoder {
    fn default() -> Self {
        Self::new(H3_RESOLUTION)
    }
}

impl SpatialTemporalEncoder {
    pub fn new(h3_resolution: u8) -> Self {
        let resolution = Resolution::try_from(h3_resolution).unwrap_or_else(|_| {
            log::warn!(
                "H3 resolution {} out of range, using {}",
                h3_resolution,
                H3_RESOLUTION
            );
            Resolution::Eight
        });
        Self { resolution }
    }

    pub fn resolution(&self) -> u8 {
        u8::from(self.resolution)
    }

    pub fn encode_space(&self, location: Location) -> EngineResult<SpatialCell> {
        let location = location.validate()?;
        let latlng = LatLng::new(location.latitude, location.longitude).map_err(|_| {
            EngineError::InvalidCoordinate {
                latitude: location.latitude,
                longitude: location.longitude,
            }
        })?;
        Ok(SpatialCell::new(latlng.to_cell(self.resolution)))
    }

    pub fn encode_time(&self, timestamp: NaiveDateTime) -> TimeFeatures {
        let hour = timestamp.hour();
        let day_of_week = timestamp.weekday().num_days_from_monday();
        let (hour_sin, hour_cos) = cyclical(hour as f64, TimeUtils::HOURS_IN_D as f64);
        let (dow_sin, dow_cos) = cyclical(day_of_week as f64, TimeUtils::DAYS_IN_W as f64);

        TimeFeatures {
            hour,
            day_of_week,
            day_of_month: timestamp.day(),
            month: timestamp.month(),
            is_weekend: day_of_week >= 5,
            is_holiday: is_us_federal_holiday(timestamp.date()),
            hour_sin,
            hour_cos,
            dow_sin,
            dow_cos,
        }
    }

    /// Cells within grid distance `k` of `cell`, the cell itself included.
    pub fn neighbors(&self, cell: SpatialCell, k: u32) -> Vec<SpatialCell> {
        cell.index()
            .grid_disk_safe(k)
            .map(SpatialCell::new)
            .collect()
    }
}

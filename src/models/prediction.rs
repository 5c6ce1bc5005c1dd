use chrono::NaiveDateTime;
use serde::Serialize;
use strum_macros::Display;

use crate::config::RiskLevel;
use crate::domain::{Location, SpatialCell};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactorCategory {
    Time,
    Weather,
    Calendar,
}

/// A rule-based driver of congestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributingFactor {
    pub factor: String,
    pub impact: f64,
    pub category: FactorCategory,
}

/// A model feature ranked by its contribution to one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionFactor {
    pub feature: String,
    pub impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h3_cell: Option<SpatialCell>,
}

impl From<Location> for ForecastLocation {
    fn from(l: Location) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            h3_cell: None,
        }
    }
}

/// A finished forecast for one place and time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Clipped to [0, 1], reported to 3 decimals
    pub congestion_score: f64,
    pub risk_level: RiskLevel,
    pub timestamp: NaiveDateTime,
    pub location: ForecastLocation,
    pub top_factors: Vec<ContributingFactor>,
    pub attribution_factors: Vec<AttributionFactor>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

/// Marker left in the slot of an item that could not be predicted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem {
    pub error: String,
    pub location: Location,
    #[serde(skip)]
    pub cause: EngineError,
}

impl FailedItem {
    pub fn new(cause: EngineError, location: Location) -> Self {
        Self {
            error: cause.to_string(),
            location,
            cause,
        }
    }
}

/// One slot of a batch or time series: a forecast or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastItem {
    Predicted(PredictionResult),
    Failed(FailedItem),
}

impl ForecastItem {
    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            ForecastItem::Predicted(p) => Some(p),
            ForecastItem::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailedItem> {
        match self {
            ForecastItem::Predicted(_) => None,
            ForecastItem::Failed(f) => Some(f),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ForecastItem::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeseriesItem {
    pub hours_ahead: u32,
    #[serde(flatten)]
    pub item: ForecastItem,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> PredictionResult {
        PredictionResult {
            congestion_score: 0.42,
            risk_level: RiskLevel::Low,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            location: ForecastLocation::from(Location::new(37.77, -122.42).unwrap()),
            top_factors: vec![ContributingFactor {
                factor: "Morning Rush Hour".into(),
                impact: 0.3,
                category: FactorCategory::Time,
            }],
            attribution_factors: vec![],
            recommendations: vec!["Normal traffic conditions expected".into()],
            confidence: 0.85,
        }
    }

    #[test]
    fn failed_item_serializes_as_error_marker() {
        let loc = Location {
            latitude: 95.0,
            longitude: 0.0,
        };
        let item = ForecastItem::Failed(FailedItem::new(
            EngineError::InvalidCoordinate {
                latitude: 95.0,
                longitude: 0.0,
            },
            loc,
        ));
        let v = serde_json::to_value(&item).unwrap();
        assert!(v["error"].as_str().unwrap().contains("invalid coordinate"));
        assert_eq!(v["location"]["latitude"], 95.0);
        assert!(v.get("cause").is_none());
    }

    #[test]
    fn timeseries_item_flattens_the_prediction() {
        let item = TimeseriesItem {
            hours_ahead: 6,
            item: ForecastItem::Predicted(sample()),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["hours_ahead"], 6);
        assert_eq!(v["risk_level"], "low");
        assert_eq!(v["timestamp"], "2024-03-05T08:00:00");
        assert_eq!(v["top_factors"][0]["category"], "time");
        assert!(v["location"].get("h3_cell").is_none());
    }
}

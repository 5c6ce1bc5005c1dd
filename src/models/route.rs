use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::RiskLevel;
use crate::domain::Location;

/// Forecast state of a single waypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaypointForecast {
    /// Interpolated, not yet predicted
    Pending,
    Predicted {
        congestion_score: f64,
        risk_level: RiskLevel,
    },
    Failed {
        error: String,
    },
}

/// A point along the straight-line route, with its arrival offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWaypoint {
    pub location: Location,
    /// Hours after departure, unrounded
    #[serde(skip)]
    pub offset_hours: f64,
    pub eta_minutes: u32,
    #[serde(flatten)]
    pub forecast: WaypointForecast,
}

impl RouteWaypoint {
    pub fn congestion_score(&self) -> Option<f64> {
        match self.forecast {
            WaypointForecast::Predicted {
                congestion_score, ..
            } => Some(congestion_score),
            _ => None,
        }
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        match self.forecast {
            WaypointForecast::Predicted { risk_level, .. } => Some(risk_level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRisk {
    pub average_congestion: f64,
    pub max_congestion: f64,
    pub overall_risk: RiskLevel,
    /// Waypoints that produced a score
    pub predicted_waypoints: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureOptimization {
    pub requested_departure: NaiveDateTime,
    pub optimal_departure: NaiveDateTime,
    /// Signed, 1 decimal
    pub time_shift_hours: f64,
    pub potential_savings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub start: Location,
    pub end: Location,
    pub departure: NaiveDateTime,
    pub waypoints: Vec<RouteWaypoint>,
    pub risk: RouteRisk,
    pub optimization: DepartureOptimization,
}

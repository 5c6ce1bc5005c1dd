use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use futures::future::join_all;

use crate::config::{DF, RiskLevel, RouteSettings};
use crate::domain::Location;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DepartureOptimization, RouteRisk, RouteSummary, RouteWaypoint, WaypointForecast,
};
use crate::utils::{TimeUtils, lerp, round_to};

/// What the simulator needs from a forecaster: a score and tier for one point in time.
#[async_trait]
pub trait WaypointScorer: Send + Sync {
    /// Reported (clipped, rounded) score and its risk tier.
    async fn score(&self, location: Location, at: NaiveDateTime) -> EngineResult<(f64, RiskLevel)>;

    fn classify(&self, score: f64) -> RiskLevel;
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Straight-line route simulation and departure-time search.
#[derive(Debug, Clone)]
pub struct RouteSimulator {
    settings: RouteSettings,
}

impl RouteSimulator {
    pub fn new(settings: RouteSettings) -> Self {
        Self { settings }
    }

    /// `count + 1` evenly spaced points from `start` to `end`, both included.
    pub fn interpolate_waypoints(
        &self,
        start: Location,
        end: Location,
        count: usize,
    ) -> Vec<RouteWaypoint> {
        let count = count.max(1);
        (0..=count)
            .map(|i| {
                let t = i as f64 / count as f64;
                let offset_hours =
                    t * self.settings.assumed_distance_km / self.settings.average_speed_kmh;
                RouteWaypoint {
                    location: Location {
                        latitude: lerp(start.latitude, end.latitude, t),
                        longitude: lerp(start.longitude, end.longitude, t),
                    },
                    offset_hours,
                    eta_minutes: (offset_hours * TimeUtils::MINS_IN_H).floor() as u32,
                    forecast: WaypointForecast::Pending,
                }
            })
            .collect()
    }

    pub async fn simulate<S: WaypointScorer + ?Sized>(
        &self,
        scorer: &S,
        start: Location,
        end: Location,
        departure: NaiveDateTime,
    ) -> EngineResult<RouteSummary> {
        let start = start.validate()?;
        let end = end.validate()?;

        let mut waypoints = self.interpolate_waypoints(start, end, self.settings.waypoint_count);

        let forecasts = join_all(waypoints.iter().map(|wp| {
            scorer.score(wp.location, departure + TimeUtils::hours(wp.offset_hours))
        }))
        .await;

        for (wp, forecast) in waypoints.iter_mut().zip(forecasts) {
            wp.forecast = match forecast {
                Ok((congestion_score, risk_level)) => WaypointForecast::Predicted {
                    congestion_score,
                    risk_level,
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("Waypoint {} failed: {}", wp.location, e);
                    WaypointForecast::Failed {
                        error: e.to_string(),
                    }
                }
            };
        }

        let scores: Vec<f64> = waypoints.iter().filter_map(|w| w.congestion_score()).collect();
        let average = mean(&scores).ok_or_else(|| {
            EngineError::PredictionFailed("no waypoint along the route could be predicted".into())
        })?;
        let max = scores.iter().copied().fold(f64::MIN, f64::max);

        let risk = RouteRisk {
            average_congestion: round_to(average, 3),
            max_congestion: round_to(max, 3),
            overall_risk: scorer.classify(average),
            predicted_waypoints: scores.len(),
        };

        let optimization = self
            .optimize_departure(scorer, &waypoints, departure, average)
            .await?;

        Ok(RouteSummary {
            start,
            end,
            departure,
            waypoints,
            risk,
            optimization,
        })
    }

    /// Tries whole-hour shifts around `departure`, predicting every `sample_stride`-th waypoint
    /// at the shifted departure itself. A shift wins only if it beats the incumbent strictly,
    /// starting from the full-route `baseline`.
    pub async fn optimize_departure<S: WaypointScorer + ?Sized>(
        &self,
        scorer: &S,
        waypoints: &[RouteWaypoint],
        departure: NaiveDateTime,
        baseline: f64,
    ) -> EngineResult<DepartureOptimization> {
        let window = self.settings.search_window_hours;
        let stride = self.settings.sample_stride.max(1);
        let samples: Vec<Location> = waypoints.iter().step_by(stride).map(|w| w.location).collect();

        let mut best = (departure, baseline);

        for offset in -window..=window {
            let test_time = departure + Duration::hours(offset);
            let results = join_all(samples.iter().map(|loc| scorer.score(*loc, test_time))).await;

            let mut scores = Vec::with_capacity(results.len());
            for r in results {
                match r {
                    Ok((score, _)) => scores.push(score),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(_) => {}
                }
            }

            let Some(avg) = mean(&scores) else {
                log::warn!("No samples predicted for departure offset {}h", offset);
                continue;
            };

            if DF.log_route_search {
                log::info!("Departure offset {:+}h -> mean {:.3}", offset, avg);
            }

            if avg < best.1 {
                best = (test_time, avg);
            }
        }

        let shift = TimeUtils::hours_between(departure, best.0);
        let potential_savings = if shift != 0.0 {
            format!("{:.1} hours", shift.abs())
        } else {
            "No change recommended".to_string()
        };

        Ok(DepartureOptimization {
            requested_departure: departure,
            optimal_departure: best.0,
            time_shift_hours: round_to(shift, 1),
            potential_savings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENGINE, RiskThresholds};
    use chrono::{NaiveDate, Timelike};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn simulator() -> RouteSimulator {
        RouteSimulator::new(ENGINE.route.clone())
    }

    /// Score depends only on the hour: 0.1 per hour away from 10:00.
    struct HourValley;

    #[async_trait]
    impl WaypointScorer for HourValley {
        async fn score(&self, _loc: Location, at: NaiveDateTime) -> EngineResult<(f64, RiskLevel)> {
            let s = ((at.hour() as f64 - 10.0).abs() * 0.1).min(1.0);
            Ok((s, self.classify(s)))
        }

        fn classify(&self, score: f64) -> RiskLevel {
            RiskThresholds::DEFAULT.classify(score)
        }
    }

    /// Fails every point north of 38°.
    struct NorthFails;

    #[async_trait]
    impl WaypointScorer for NorthFails {
        async fn score(&self, loc: Location, _at: NaiveDateTime) -> EngineResult<(f64, RiskLevel)> {
            if loc.latitude > 38.0 {
                Err(EngineError::PredictionFailed("no data".into()))
            } else {
                Ok((0.5, RiskLevel::Low))
            }
        }

        fn classify(&self, score: f64) -> RiskLevel {
            RiskThresholds::DEFAULT.classify(score)
        }
    }

    #[test]
    fn waypoints_span_the_route() {
        let start = Location::new(37.7749, -122.4194).unwrap();
        let end = Location::new(37.3382, -121.8863).unwrap();
        let wps = simulator().interpolate_waypoints(start, end, 10);

        assert_eq!(wps.len(), 11);
        assert_eq!(wps[0].location, start);
        assert_eq!(wps[10].location, end);
        assert_eq!(wps[0].eta_minutes, 0);
        assert_eq!(wps[5].eta_minutes, 10);
        assert_eq!(wps[10].eta_minutes, 20);
        assert!(wps.iter().all(|w| w.forecast == WaypointForecast::Pending));
    }

    #[tokio::test]
    async fn finds_the_two_hour_shift() {
        let start = Location::new(37.7749, -122.4194).unwrap();
        let end = Location::new(37.8044, -122.2712).unwrap();
        let summary = simulator()
            .simulate(&HourValley, start, end, at(8))
            .await
            .unwrap();

        assert_eq!(summary.optimization.optimal_departure, at(10));
        assert_eq!(summary.optimization.time_shift_hours, 2.0);
        assert_eq!(summary.optimization.potential_savings, "2.0 hours");
        assert_eq!(summary.risk.predicted_waypoints, 11);
        assert_eq!(summary.risk.overall_risk, RiskLevel::Low);
    }

    #[tokio::test]
    async fn no_better_slot_keeps_departure() {
        let start = Location::new(37.0, -122.0).unwrap();
        let end = Location::new(37.2, -122.2).unwrap();
        let summary = simulator()
            .simulate(&HourValley, start, end, at(10))
            .await
            .unwrap();

        assert_eq!(summary.optimization.optimal_departure, at(10));
        assert_eq!(summary.optimization.time_shift_hours, 0.0);
        assert_eq!(summary.optimization.potential_savings, "No change recommended");
    }

    #[tokio::test]
    async fn partial_failures_are_flagged_per_waypoint() {
        let start = Location::new(37.5, -122.0).unwrap();
        let end = Location::new(38.5, -122.0).unwrap();
        let summary = simulator()
            .simulate(&NorthFails, start, end, at(9))
            .await
            .unwrap();

        let failed = summary
            .waypoints
            .iter()
            .filter(|w| matches!(w.forecast, WaypointForecast::Failed { .. }))
            .count();
        assert_eq!(failed, 5);
        assert_eq!(summary.risk.predicted_waypoints, 6);
        assert_eq!(summary.risk.average_congestion, 0.5);
    }

    #[tokio::test]
    async fn all_failures_fail_the_route() {
        let start = Location::new(39.0, -122.0).unwrap();
        let end = Location::new(39.5, -122.0).unwrap();
        let err = simulator()
            .simulate(&NorthFails, start, end, at(9))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PredictionFailed(_)));
    }
}

use crate::config::RiskLevel;
use crate::models::ContributingFactor;

const CRITICAL: &[&str] = &[
    "Avoid this route if possible - severe congestion expected",
    "Consider alternative transportation methods",
    "Enable traffic advisories for this area",
];
const HIGH: &[&str] = &[
    "Delay departure by 1-2 hours if possible",
    "Pre-position emergency vehicles in nearby areas",
    "Enable real-time traffic monitoring",
];
const MEDIUM: &[&str] = &[
    "Allow extra travel time (15-30 minutes)",
    "Check alternative routes before departure",
];
const LOW: &[&str] = &["Normal traffic conditions expected", "Good time for travel"];

const WET_ROADS: &str = "Drive carefully - wet road conditions";
const FOG: &str = "Use fog lights and reduce speed";
const ICE: &str = "Watch for ice - reduce speed significantly";

/// Turns a risk tier and its factors into short advisories.
#[derive(Debug, Clone)]
pub struct RecommendationGenerator {
    max_recommendations: usize,
}

impl RecommendationGenerator {
    pub fn new(max_recommendations: usize) -> Self {
        Self {
            max_recommendations,
        }
    }

    pub fn generate(&self, risk_level: RiskLevel, factors: &[ContributingFactor]) -> Vec<String> {
        let base = match risk_level {
            RiskLevel::Critical => CRITICAL,
            RiskLevel::High => HIGH,
            RiskLevel::Medium => MEDIUM,
            RiskLevel::Low => LOW,
        };

        // One advisory per factor at most, first match wins.
        let weather = factors.iter().filter_map(|f| {
            if f.factor.contains("Precipitation") {
                Some(WET_ROADS)
            } else if f.factor.contains("Visibility") {
                Some(FOG)
            } else if f.factor.contains("Freezing") {
                Some(ICE)
            } else {
                None
            }
        });

        base.iter()
            .copied()
            .chain(weather)
            .take(self.max_recommendations)
            .map(str::to_string)
            .collect()
    }
}

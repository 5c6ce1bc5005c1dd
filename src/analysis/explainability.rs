use std::cmp::Ordering;

use crate::config::ExplanationSettings;
use crate::models::{
    Attribution, AttributionFactor, ContributingFactor, FactorCategory, FeatureRecord,
    FeatureVector,
};
use crate::utils::round_to;

struct FactorRule {
    factor: &'static str,
    impact: f64,
    category: FactorCategory,
    applies: fn(&FeatureRecord) -> bool,
}

// Evaluated independently, in this order. Ties keep table order after sorting.
const RULES: [FactorRule; 7] = [
    FactorRule {
        factor: "Morning Rush Hour",
        impact: 0.30,
        category: FactorCategory::Time,
        applies: |r| (7..=9).contains(&r.time.hour),
    },
    FactorRule {
        factor: "Evening Rush Hour",
        impact: 0.35,
        category: FactorCategory::Time,
        applies: |r| (17..=19).contains(&r.time.hour),
    },
    FactorRule {
        factor: "Heavy Precipitation",
        impact: 0.20,
        category: FactorCategory::Weather,
        applies: |r| r.weather.precipitation > 5.0,
    },
    FactorRule {
        factor: "Low Visibility",
        impact: 0.15,
        category: FactorCategory::Weather,
        applies: |r| r.weather.visibility < 8.0,
    },
    FactorRule {
        factor: "Freezing Temperature",
        impact: 0.10,
        category: FactorCategory::Weather,
        applies: |r| r.weather.temperature < 0.0,
    },
    FactorRule {
        factor: "Weekday Traffic",
        impact: 0.10,
        category: FactorCategory::Calendar,
        applies: |r| !r.time.is_weekend,
    },
    FactorRule {
        factor: "Holiday Period",
        impact: 0.15,
        category: FactorCategory::Calendar,
        applies: |r| r.time.is_holiday,
    },
];

/// Rule factors and model attribution for a single prediction.
#[derive(Debug, Clone)]
pub struct ExplainabilityModule {
    max_factors: usize,
    max_attributions: usize,
}

impl ExplainabilityModule {
    pub fn new(settings: &ExplanationSettings) -> Self {
        Self {
            max_factors: settings.max_factors,
            max_attributions: settings.max_attributions,
        }
    }

    pub fn top_factors(&self, record: &FeatureRecord) -> Vec<ContributingFactor> {
        let mut factors: Vec<ContributingFactor> = RULES
            .iter()
            .filter(|rule| (rule.applies)(record))
            .map(|rule| ContributingFactor {
                factor: rule.factor.to_string(),
                impact: rule.impact,
                category: rule.category,
            })
            .collect();

        // sort_by is stable
        factors.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(Ordering::Equal));
        factors.truncate(self.max_factors);
        factors
    }

    /// Features ranked by |contribution|. Never fails: no explainer or a failing one yields nothing.
    pub fn attribution_factors(
        &self,
        attribution: &Attribution,
        features: &FeatureVector,
    ) -> Vec<AttributionFactor> {
        let Some(explainer) = attribution.explainer() else {
            return Vec::new();
        };

        let contributions = match explainer.contributions(features.values()) {
            Ok(c) if c.len() == features.len() => c,
            Ok(c) => {
                log::warn!(
                    "Attribution returned {} values for {} features; skipping",
                    c.len(),
                    features.len()
                );
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Could not compute attribution: {:#}", e);
                return Vec::new();
            }
        };

        let mut ranked: Vec<(&str, f64)> = features
            .names()
            .iter()
            .map(String::as_str)
            .zip(contributions)
            .collect();
        ranked.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(Ordering::Equal));

        ranked
            .into_iter()
            .take(self.max_attributions)
            .map(|(feature, impact)| AttributionFactor {
                feature: feature.to_string(),
                impact: round_to(impact, 3),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SpatialTemporalEncoder;
    use crate::config::ENGINE;
    use crate::domain::{Location, WeatherSnapshot};
    use crate::models::{Explainer, FeatureSchema, HistoryFeatures};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    fn module() -> ExplainabilityModule {
        ExplainabilityModule::new(&ENGINE.explanation)
    }

    fn record(ts: NaiveDateTime, weather: WeatherSnapshot) -> FeatureRecord {
        FeatureRecord {
            location: Location::new(37.77, -122.42).unwrap(),
            time: SpatialTemporalEncoder::default().encode_time(ts),
            weather,
            history: HistoryFeatures::default(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn names(factors: &[ContributingFactor]) -> Vec<&str> {
        factors.iter().map(|f| f.factor.as_str()).collect()
    }

    #[test]
    fn weekday_evening_in_the_rain() {
        let weather = WeatherSnapshot {
            precipitation: 12.0,
            visibility: 4.0,
            ..WeatherSnapshot::NEUTRAL
        };
        let factors = module().top_factors(&record(at(2024, 3, 12, 18), weather));
        assert_eq!(
            names(&factors),
            vec![
                "Evening Rush Hour",
                "Heavy Precipitation",
                "Low Visibility",
                "Weekday Traffic"
            ]
        );
    }

    #[test]
    fn ties_keep_table_order_and_cap_at_five() {
        // Monday Jan 15 2024 (MLK day), 8am, freezing fog and snow
        let weather = WeatherSnapshot {
            temperature: -4.0,
            precipitation: 8.0,
            visibility: 2.0,
            ..WeatherSnapshot::NEUTRAL
        };
        let factors = module().top_factors(&record(at(2024, 1, 15, 8), weather));
        assert_eq!(
            names(&factors),
            vec![
                "Morning Rush Hour",
                "Heavy Precipitation",
                "Low Visibility",
                "Holiday Period",
                "Freezing Temperature"
            ]
        );
    }

    #[test]
    fn quiet_weekend_has_no_factors() {
        let factors = module().top_factors(&record(at(2024, 3, 10, 13), WeatherSnapshot::NEUTRAL));
        assert!(factors.is_empty());
    }

    struct Fixed(Vec<f64>);
    impl Explainer for Fixed {
        fn contributions(&self, _row: &[f64]) -> anyhow::Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;
    impl Explainer for Broken {
        fn contributions(&self, _row: &[f64]) -> anyhow::Result<Vec<f64>> {
            anyhow::bail!("explainer exploded")
        }
    }

    #[test]
    fn attribution_ranks_by_magnitude() {
        let schema = Arc::new(FeatureSchema::from_names(&["hour", "precipitation", "visibility"]).unwrap());
        let vector = record(at(2024, 3, 12, 18), WeatherSnapshot::NEUTRAL).project(&schema);

        let attribution = Attribution::Available(Arc::new(Fixed(vec![0.05, -0.41234, 0.2])));
        let ranked = module().attribution_factors(&attribution, &vector);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].feature, "precipitation");
        assert_eq!(ranked[0].impact, -0.412);
        assert_eq!(ranked[2].feature, "hour");

        assert!(module().attribution_factors(&Attribution::Unavailable, &vector).is_empty());
        let broken = Attribution::Available(Arc::new(Broken));
        assert!(module().attribution_factors(&broken, &vector).is_empty());
    }
}

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Timelike;
use itertools::Itertools;
use serde::Serialize;
use statrs::statistics::Statistics;
use strum::IntoEnumIterator;

use crate::config::RiskLevel;
use crate::config::constants::insights::{MAX_IMPORTANCES, MAX_PEAK_HOURS};
use crate::models::PredictionResult;
use crate::utils::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreStatistics {
    pub avg_congestion: f64,
    pub max_congestion: f64,
    pub min_congestion: f64,
    /// Population standard deviation
    pub std_congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHour {
    pub hour: u32,
    pub avg_congestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub features_count: usize,
    pub model_type: String,
}

/// Aggregate view over a set of sample forecasts plus what the model says about itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub feature_importance: Vec<FeatureImportance>,
    pub statistics: Option<ScoreStatistics>,
    pub peak_hours: Vec<PeakHour>,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub sample_size: usize,
    pub model_info: ModelInfo,
}

/// Pairs names with importances, highest first. Mismatched lengths yield nothing.
pub fn rank_importances(names: &[String], importances: Option<&[f64]>) -> Vec<FeatureImportance> {
    let Some(values) = importances.filter(|v| v.len() == names.len()) else {
        return Vec::new();
    };

    names
        .iter()
        .zip(values)
        .sorted_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(Ordering::Equal))
        .take(MAX_IMPORTANCES)
        .map(|(name, v)| FeatureImportance {
            feature: name.clone(),
            importance: round_to(*v, 4),
        })
        .collect()
}

pub fn score_statistics(scores: &[f64]) -> Option<ScoreStatistics> {
    if scores.is_empty() {
        return None;
    }
    let max = scores.iter().copied().fold(f64::MIN, f64::max);
    let min = scores.iter().copied().fold(f64::MAX, f64::min);
    Some(ScoreStatistics {
        avg_congestion: round_to(scores.iter().mean(), 3),
        max_congestion: round_to(max, 3),
        min_congestion: round_to(min, 3),
        std_congestion: round_to(scores.iter().population_std_dev(), 3),
    })
}

/// Mean score per hour of day, busiest first.
pub fn peak_hours(predictions: &[PredictionResult]) -> Vec<PeakHour> {
    predictions
        .iter()
        .map(|p| (p.timestamp.hour(), p.congestion_score))
        .into_group_map()
        .into_iter()
        .map(|(hour, scores)| PeakHour {
            hour,
            avg_congestion: round_to(scores.iter().sum::<f64>() / scores.len() as f64, 3),
        })
        // Ties: earlier hour first
        .sorted_by(|a, b| {
            b.avg_congestion
                .partial_cmp(&a.avg_congestion)
                .unwrap_or(Ordering::Equal)
                .then(a.hour.cmp(&b.hour))
        })
        .take(MAX_PEAK_HOURS)
        .collect()
}

pub fn risk_distribution(predictions: &[PredictionResult]) -> BTreeMap<RiskLevel, usize> {
    let counts = predictions.iter().map(|p| p.risk_level).counts();
    RiskLevel::iter()
        .map(|level| (level, counts.get(&level).copied().unwrap_or(0)))
        .collect()
}

impl Insights {
    pub fn from_predictions(
        predictions: &[PredictionResult],
        feature_names: &[String],
        importances: Option<&[f64]>,
        model_type: &str,
    ) -> Self {
        let scores: Vec<f64> = predictions.iter().map(|p| p.congestion_score).collect();
        Self {
            feature_importance: rank_importances(feature_names, importances),
            statistics: score_statistics(&scores),
            peak_hours: peak_hours(predictions),
            risk_distribution: risk_distribution(predictions),
            sample_size: predictions.len(),
            model_info: ModelInfo {
                features_count: feature_names.len(),
                model_type: model_type.to_string(),
            },
        }
    }
}

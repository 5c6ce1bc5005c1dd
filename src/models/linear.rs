use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::artifact::{Explainer, Regressor};
use super::features::FeatureMatrix;

/// `score = intercept + Σ w_i·x_i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub weights: Vec<f64>,
    /// Reference input for attribution. Zero vector when absent.
    #[serde(default)]
    pub baseline: Option<Vec<f64>>,
}

impl LinearModel {
    pub fn new(intercept: f64, weights: Vec<f64>) -> Self {
        Self {
            intercept,
            weights,
            baseline: None,
        }
    }

    pub fn with_baseline(mut self, baseline: Vec<f64>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.weights.len() {
            bail!(
                "linear model has {} weights but received {} features",
                self.weights.len(),
                width
            );
        }
        Ok(())
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl Regressor for LinearModel {
    fn model_type(&self) -> &str {
        "linear"
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        self.check_width(matrix.width())?;
        let scores: Vec<f64> = matrix.rows().map(|row| self.score_row(row)).collect();
        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            bail!("non-finite score for row {}", bad);
        }
        Ok(scores)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if total <= 0.0 {
            return None;
        }
        Some(self.weights.iter().map(|w| w.abs() / total).collect())
    }
}

impl Explainer for LinearModel {
    fn contributions(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        let contributions = match &self.baseline {
            Some(base) => {
                self.check_width(base.len())?;
                self.weights
                    .iter()
                    .zip(row.iter().zip(base))
                    .map(|(w, (x, b))| w * (x - b))
                    .collect()
            }
            None => self.weights.iter().zip(row).map(|(w, x)| w * x).collect(),
        };
        Ok(contributions)
    }
}

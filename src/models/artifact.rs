use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::RiskThresholds;

use super::features::FeatureMatrix;
use super::linear::LinearModel;

/// Abstract interface for a trained congestion regressor.
/// Implementations are read-only after load and shared across tasks.
pub trait Regressor: Send + Sync {
    /// Short label for logs and `model_info`, e.g. "linear".
    fn model_type(&self) -> &str;

    /// One raw score per matrix row, same order.
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Per-feature importance in schema order, if the model exposes one.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Per-feature signed contribution to one prediction.
pub trait Explainer: Send + Sync {
    fn contributions(&self, row: &[f64]) -> Result<Vec<f64>>;
}

/// Whether the loaded model can attribute its own output.
#[derive(Clone, Default)]
pub enum Attribution {
    Available(Arc<dyn Explainer>),
    #[default]
    Unavailable,
}

impl Attribution {
    pub fn explainer(&self) -> Option<&Arc<dyn Explainer>> {
        match self {
            Attribution::Available(e) => Some(e),
            Attribution::Unavailable => None,
        }
    }
}

impl std::fmt::Debug for Attribution {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Attribution::Available(_) => write!(f, "Attribution::Available"),
            Attribution::Unavailable => write!(f, "Attribution::Unavailable"),
        }
    }
}

/// A loaded model plus the metadata the engine needs to drive it.
#[derive(Clone)]
pub struct ModelArtifact {
    pub model: Arc<dyn Regressor>,
    pub attribution: Attribution,
    /// Feature names in trained order
    pub feature_schema: Vec<String>,
    pub risk_thresholds: Option<RiskThresholds>,
}

impl ModelArtifact {
    pub fn new(model: Arc<dyn Regressor>, feature_schema: Vec<String>) -> Self {
        Self {
            model,
            attribution: Attribution::Unavailable,
            feature_schema,
            risk_thresholds: None,
        }
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.attribution = Attribution::Available(explainer);
        self
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.risk_thresholds = Some(thresholds);
        self
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("model", &self.model.model_type())
            .field("attribution", &self.attribution)
            .field("features", &self.feature_schema.len())
            .field("risk_thresholds", &self.risk_thresholds)
            .finish()
    }
}

/// Model payloads the artifact file can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSpec {
    Linear(LinearModel),
}

/// On-disk artifact layout (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub feature_schema: Vec<String>,
    #[serde(default)]
    pub risk_thresholds: Option<RiskThresholds>,
    pub model: ModelSpec,
}

fn default_version() -> u32 {
    crate::config::PERSISTENCE.version
}

impl ArtifactFile {
    pub fn into_artifact(self) -> ModelArtifact {
        let artifact = match self.model {
            ModelSpec::Linear(linear) => {
                let linear = Arc::new(linear);
                ModelArtifact::new(linear.clone(), self.feature_schema).with_explainer(linear)
            }
        };
        match self.risk_thresholds {
            Some(t) => artifact.with_thresholds(t),
            None => artifact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_file_parses_linear_payload() {
        let json = r#"{
            "feature_schema": ["hour", "precipitation"],
            "risk_thresholds": {"low": 0.2, "medium": 0.5, "high": 0.7, "critical": 0.85},
            "model": {"kind": "linear", "intercept": 0.1, "weights": [0.02, 0.05]}
        }"#;
        let file: ArtifactFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.feature_schema.len(), 2);

        let artifact = file.into_artifact();
        assert_eq!(artifact.model.model_type(), "linear");
        assert!(artifact.attribution.explainer().is_some());
        assert_eq!(artifact.risk_thresholds.map(|t| t.critical), Some(0.85));
    }

    #[test]
    fn unknown_model_kind_is_rejected() {
        let json = r#"{"feature_schema": ["hour"], "model": {"kind": "forest", "trees": []}}"#;
        assert!(serde_json::from_str::<ArtifactFile>(json).is_err());
    }
}

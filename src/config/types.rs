//! Value types shared by the configuration blueprints and the engine.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// A congestion score clamped into the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CongestionScore(f64);

impl CongestionScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;

    /// Clips a raw model output into `[0, 1]`. Models extrapolate, scores must not.
    pub const fn new(raw: f64) -> Self {
        let v = if raw < Self::MIN {
            Self::MIN
        } else if raw > Self::MAX {
            Self::MAX
        } else {
            raw
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// The score as reported to callers (3 decimals).
    pub fn rounded(self) -> f64 {
        crate::utils::round_to(self.0, 3)
    }
}

impl std::fmt::Display for CongestionScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Ascending cut points in `[0, 1]`.
/// `low` is carried for completeness; anything below `medium` is already low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl RiskThresholds {
    pub const DEFAULT: Self = Self {
        low: 0.3,
        medium: 0.6,
        high: 0.8,
        critical: 0.9,
    };

    /// Inclusive, upper-bound-first classification.
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score >= self.critical {
            RiskLevel::Critical
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// True when all cut points lie in `[0, 1]` and never decrease.
    pub fn is_valid(&self) -> bool {
        let points = [self.low, self.medium, self.high, self.critical];
        points.iter().all(|p| (0.0..=1.0).contains(p))
            && points.windows(2).all(|w| w[0] <= w[1])
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether batch predictions carry per-item explanations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    Default,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchMode {
    /// One model call, no factors or recommendations.
    #[default]
    Fast,
    /// One model call, then rule factors and recommendations per item.
    Explained,
}

use thiserror::Error;

/// Failure kinds surfaced by the forecast engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid coordinate ({latitude}, {longitude}): latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("feature schema mismatch: {0}")]
    InvalidFeatureSchema(String),

    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Only ever logged. Weather failures fall back to neutral defaults.
    #[error("weather fetch failed: {0}")]
    WeatherFetchFailed(String),

    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}

impl EngineError {
    /// Schema and load failures make every later prediction meaningless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidFeatureSchema(_) | EngineError::ModelNotLoaded(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality() {
        assert!(EngineError::InvalidFeatureSchema("x".into()).is_fatal());
        assert!(EngineError::ModelNotLoaded("x".into()).is_fatal());
        assert!(!EngineError::PredictionFailed("x".into()).is_fatal());
        assert!(
            !EngineError::InvalidCoordinate {
                latitude: 91.0,
                longitude: 0.0
            }
            .is_fatal()
        );
    }
}

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::{HistoricalAggregates, Location, WeatherSnapshot};
use crate::error::EngineResult;
use crate::models::{FeatureRecord, FeatureSchema, FeatureVector, HistoryFeatures};

use super::spatial_temporal::SpatialTemporalEncoder;

/// Assembles model inputs in the order the artifact was trained on.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    encoder: SpatialTemporalEncoder,
    schema: Arc<FeatureSchema>,
}

impl FeatureBuilder {
    pub fn new(encoder: SpatialTemporalEncoder, schema: Arc<FeatureSchema>) -> Self {
        Self { encoder, schema }
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn encoder(&self) -> &SpatialTemporalEncoder {
        &self.encoder
    }

    /// Full typed record. Absent weather means neutral conditions, absent history means zeros.
    pub fn record(
        &self,
        location: Location,
        timestamp: NaiveDateTime,
        weather: Option<&WeatherSnapshot>,
        historical: Option<&HistoricalAggregates>,
    ) -> EngineResult<FeatureRecord> {
        Ok(FeatureRecord {
            location: location.validate()?,
            time: self.encoder.encode_time(timestamp),
            weather: weather.copied().unwrap_or(WeatherSnapshot::NEUTRAL),
            history: HistoryFeatures::from_aggregates(historical),
        })
    }

    pub fn build(
        &self,
        location: Location,
        timestamp: NaiveDateTime,
        weather: Option<&WeatherSnapshot>,
        historical: Option<&HistoricalAggregates>,
    ) -> EngineResult<FeatureVector> {
        self.record(location, timestamp, weather, historical)
            .map(|r| r.project(&self.schema))
    }
}

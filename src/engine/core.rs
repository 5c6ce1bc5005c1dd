use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::future::join_all;
use rayon::prelude::*;

use crate::analysis::{
    ExplainabilityModule, FeatureBuilder, Insights, RecommendationGenerator, RouteSimulator,
    SpatialTemporalEncoder, WaypointScorer,
};
use crate::config::{
    BatchMode, CongestionScore, DEMO, DF, EngineConfig, RiskLevel, constants::insights::HORIZONS_H,
};
use crate::data::{WeatherCache, WeatherProvider};
use crate::domain::{HistoricalAggregates, Location, SpatialCell, WeatherSnapshot};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    FailedItem, FeatureMatrix, FeatureRecord, FeatureSchema, FeatureVector, ForecastItem,
    ForecastLocation, ModelArtifact, PredictionResult, RouteSummary, TimeseriesItem,
};
use crate::trace_time;
use crate::utils::TimeUtils;

/// Owns a loaded model and turns requests into forecasts.
pub struct PredictionEngine {
    artifact: ModelArtifact,
    config: EngineConfig,

    builder: FeatureBuilder,
    explainer: ExplainabilityModule,
    recommender: RecommendationGenerator,
    router: RouteSimulator,

    weather_cache: WeatherCache,
    weather_provider: Option<Arc<dyn WeatherProvider>>,
}

impl PredictionEngine {
    /// Validates the artifact's feature schema and thresholds up front.
    /// Artifact thresholds, when present, replace the configured ones.
    pub fn new(artifact: ModelArtifact, config: EngineConfig) -> EngineResult<Self> {
        let schema = Arc::new(FeatureSchema::from_names(&artifact.feature_schema)?);
        let config = config.with_thresholds(artifact.risk_thresholds);
        if !config.risk_thresholds.is_valid() {
            return Err(EngineError::ModelNotLoaded(format!(
                "risk thresholds {:?} must ascend within [0, 1]",
                config.risk_thresholds
            )));
        }

        let encoder = SpatialTemporalEncoder::new(config.spatial.h3_resolution);
        if DF.log_artifact {
            log::info!(
                "Prediction engine ready: {} model, {} features, batch mode {}",
                artifact.model.model_type(),
                schema.len(),
                config.batch_mode
            );
        }

        Ok(Self {
            builder: FeatureBuilder::new(encoder, schema),
            explainer: ExplainabilityModule::new(&config.explanation),
            recommender: RecommendationGenerator::new(config.explanation.max_recommendations),
            router: RouteSimulator::new(config.route.clone()),
            weather_cache: WeatherCache::new(&config.weather),
            weather_provider: None,
            artifact,
            config,
        })
    }

    pub fn with_weather_provider(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather_provider = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn features_count(&self) -> usize {
        self.builder.schema().len()
    }

    pub fn model_type(&self) -> &str {
        self.artifact.model.model_type()
    }

    pub fn weather_cache(&self) -> &WeatherCache {
        &self.weather_cache
    }

    pub fn risk_level(&self, score: f64) -> RiskLevel {
        self.config.risk_thresholds.classify(score)
    }

    pub fn encode_space(&self, location: Location) -> EngineResult<SpatialCell> {
        self.builder.encoder().encode_space(location)
    }

    /// Cells within `k` rings of `cell`, for grouping nearby forecasts.
    pub fn neighbors(&self, cell: SpatialCell, k: u32) -> Vec<SpatialCell> {
        self.builder.encoder().neighbors(cell, k)
    }

    /// Caller weather first, then the cache/provider, then neutral conditions.
    async fn resolve_weather(
        &self,
        location: Location,
        weather: Option<WeatherSnapshot>,
    ) -> WeatherSnapshot {
        if let Some(w) = weather {
            return w;
        }
        let Some(provider) = &self.weather_provider else {
            return WeatherSnapshot::NEUTRAL;
        };
        self.weather_cache
            .get_or_fetch(location, || provider.fetch(location))
            .await
            .unwrap_or(WeatherSnapshot::NEUTRAL)
    }

    /// One model call for all rows.
    fn score_vectors(&self, vectors: &[&FeatureVector]) -> EngineResult<Vec<CongestionScore>> {
        let matrix = FeatureMatrix::from_vectors(self.features_count(), vectors.iter().copied())?;
        let raw = self
            .artifact
            .model
            .predict(&matrix)
            .map_err(|e| EngineError::PredictionFailed(format!("{:#}", e)))?;

        if raw.len() != vectors.len() {
            return Err(EngineError::PredictionFailed(format!(
                "model returned {} scores for {} rows",
                raw.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = raw.iter().find(|s| !s.is_finite()) {
            return Err(EngineError::PredictionFailed(format!(
                "model returned non-finite score {}",
                bad
            )));
        }
        Ok(raw.into_iter().map(CongestionScore::new).collect())
    }

    fn assemble(
        &self,
        record: &FeatureRecord,
        vector: &FeatureVector,
        timestamp: NaiveDateTime,
        score: CongestionScore,
        location: ForecastLocation,
        explained: bool,
        attributed: bool,
    ) -> PredictionResult {
        let risk_level = self.risk_level(score.value());

        let (top_factors, recommendations) = if explained {
            let mut factors = self.explainer.top_factors(record);
            let recommendations = self.recommender.generate(risk_level, &factors);
            factors.truncate(self.config.explanation.factors_shown);
            (factors, recommendations)
        } else {
            (Vec::new(), Vec::new())
        };

        let attribution_factors = if attributed {
            self.explainer
                .attribution_factors(&self.artifact.attribution, vector)
        } else {
            Vec::new()
        };

        PredictionResult {
            congestion_score: score.rounded(),
            risk_level,
            timestamp,
            location,
            top_factors,
            attribution_factors,
            recommendations,
            confidence: self.config.confidence,
        }
    }

    pub async fn predict_single(
        &self,
        location: Location,
        timestamp: NaiveDateTime,
        weather: Option<WeatherSnapshot>,
    ) -> EngineResult<PredictionResult> {
        self.predict_single_with_history(location, timestamp, weather, None)
            .await
    }

    /// Full single prediction, with optional pre-computed lag/rolling aggregates.
    pub async fn predict_single_with_history(
        &self,
        location: Location,
        timestamp: NaiveDateTime,
        weather: Option<WeatherSnapshot>,
        historical: Option<&HistoricalAggregates>,
    ) -> EngineResult<PredictionResult> {
        let cell = self.encode_space(location)?;
        let weather = self.resolve_weather(location, weather).await;

        trace_time!("predict_single", 2_000, {
            let record = self
                .builder
                .record(location, timestamp, Some(&weather), historical)?;
            let vector = record.project(self.builder.schema());
            let score = self
                .score_vectors(&[&vector])?
                .into_iter()
                .next()
                .ok_or_else(|| EngineError::PredictionFailed("model returned no score".into()))?;

            let mut forecast_location = ForecastLocation::from(location);
            forecast_location.h3_cell = Some(cell);

            Ok(self.assemble(
                &record,
                &vector,
                timestamp,
                score,
                forecast_location,
                true,
                true,
            ))
        })
    }

    /// One slot per input location, in input order. Never consults the weather provider.
    pub fn predict_batch(
        &self,
        locations: &[Location],
        timestamp: NaiveDateTime,
    ) -> Vec<ForecastItem> {
        trace_time!("predict_batch", 10_000, {
            let records: Vec<EngineResult<(FeatureRecord, FeatureVector)>> = locations
                .par_iter()
                .map(|loc| -> EngineResult<(FeatureRecord, FeatureVector)> {
                    let record = self.builder.record(*loc, timestamp, None, None)?;
                    let vector = record.project(self.builder.schema());
                    Ok((record, vector))
                })
                .collect();

            let ready: Vec<&FeatureVector> = records
                .iter()
                .filter_map(|r| r.as_ref().ok().map(|(_, v)| v))
                .collect();

            let mut scores = self.batch_scores(&ready).into_iter();
            let explained = self.config.batch_mode == BatchMode::Explained;

            records
                .into_iter()
                .zip(locations)
                .map(|(built, location)| {
                    // `scores` holds one entry per successfully built row, same order
                    let outcome = built.and_then(|(record, vector)| {
                        let score = scores.next().unwrap_or_else(|| {
                            Err(EngineError::PredictionFailed("missing batch score".into()))
                        })?;
                        Ok(self.assemble(
                            &record,
                            &vector,
                            timestamp,
                            score,
                            ForecastLocation::from(*location),
                            explained,
                            false,
                        ))
                    });
                    match outcome {
                        Ok(result) => ForecastItem::Predicted(result),
                        Err(e) => ForecastItem::Failed(FailedItem::new(e, *location)),
                    }
                })
                .collect()
        })
    }

    /// Scores for every built row. A failing batch call is retried row by row so only
    /// the offending rows are marked.
    fn batch_scores(&self, vectors: &[&FeatureVector]) -> Vec<EngineResult<CongestionScore>> {
        if vectors.is_empty() {
            return Vec::new();
        }
        match self.score_vectors(vectors) {
            Ok(scores) => scores.into_iter().map(Ok).collect(),
            Err(e) => {
                if DF.log_batch {
                    log::warn!(
                        "Batch prediction of {} rows failed ({}); retrying row by row",
                        vectors.len(),
                        e
                    );
                }
                vectors
                    .iter()
                    .map(|v| -> EngineResult<CongestionScore> {
                        self.score_vectors(&[*v])?
                            .into_iter()
                            .next()
                            .ok_or_else(|| EngineError::PredictionFailed("model returned no score".into()))
                    })
                    .collect()
            }
        }
    }

    /// Forecasts at `start + 0, step, 2·step, … ≤ hours_ahead`.
    /// Weather is resolved once for the location and reused for every sample.
    pub async fn predict_timeseries(
        &self,
        location: Location,
        start: NaiveDateTime,
        hours_ahead: u32,
    ) -> EngineResult<Vec<TimeseriesItem>> {
        let location = location.validate()?;
        let settings = &self.config.timeseries;

        let horizon = if hours_ahead > settings.max_hours_ahead {
            log::warn!(
                "hours_ahead {} exceeds {}; truncating",
                hours_ahead,
                settings.max_hours_ahead
            );
            settings.max_hours_ahead
        } else {
            hours_ahead
        };

        let weather = self.resolve_weather(location, None).await;
        let offsets: Vec<u32> = (0..=horizon)
            .step_by(settings.step_hours.max(1) as usize)
            .collect();

        let results = join_all(offsets.iter().map(|h| {
            let at = start + TimeUtils::hours(*h as f64);
            self.predict_single(location, at, Some(weather))
        }))
        .await;

        offsets
            .into_iter()
            .zip(results)
            .map(|(hours_ahead, result)| {
                let item = match result {
                    Ok(p) => ForecastItem::Predicted(p),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => ForecastItem::Failed(FailedItem::new(e, location)),
                };
                Ok(TimeseriesItem { hours_ahead, item })
            })
            .collect()
    }

    pub async fn simulate_route(
        &self,
        start: Location,
        end: Location,
        departure: NaiveDateTime,
    ) -> EngineResult<RouteSummary> {
        self.router.simulate(self, start, end, departure).await
    }

    /// Model self-description plus statistics over sample forecasts around the demo locations.
    pub async fn insights(&self, now: NaiveDateTime) -> EngineResult<Insights> {
        let probes: Vec<(Location, NaiveDateTime)> = DEMO
            .resources
            .locations
            .iter()
            .flat_map(|s| {
                HORIZONS_H.iter().map(move |h| {
                    (
                        Location {
                            latitude: s.latitude,
                            longitude: s.longitude,
                        },
                        now + chrono::Duration::hours(*h),
                    )
                })
            })
            .collect();

        let results = join_all(
            probes
                .iter()
                .map(|(loc, at)| self.predict_single(*loc, *at, None)),
        )
        .await;

        let mut predictions = Vec::with_capacity(results.len());
        for r in results {
            match r {
                Ok(p) => predictions.push(p),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::warn!("Insight sample failed: {}", e),
            }
        }

        let importances = self.artifact.model.feature_importances();
        Ok(Insights::from_predictions(
            &predictions,
            self.builder.schema().names(),
            importances.as_deref(),
            self.model_type(),
        ))
    }
}

#[async_trait]
impl WaypointScorer for PredictionEngine {
    async fn score(&self, location: Location, at: NaiveDateTime) -> EngineResult<(f64, RiskLevel)> {
        let p = self.predict_single(location, at, None).await?;
        Ok((p.congestion_score, p.risk_level))
    }

    fn classify(&self, score: f64) -> RiskLevel {
        self.risk_level(score)
    }
}

impl std::fmt::Debug for PredictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("artifact", &self.artifact)
            .field("batch_mode", &self.config.batch_mode)
            .field("weather_provider", &self.weather_provider.is_some())
            .field("cached_weather", &self.weather_cache.len())
            .finish()
    }
}

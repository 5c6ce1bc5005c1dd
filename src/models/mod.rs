mod artifact;
mod features;
mod linear;
mod prediction;
mod route;

pub use {
    artifact::{ArtifactFile, Attribution, Explainer, ModelArtifact, ModelSpec, Regressor},
    features::{
        FeatureKey, FeatureMatrix, FeatureRecord, FeatureSchema, FeatureVector, HistoryFeatures,
        TimeFeatures,
    },
    linear::LinearModel,
    prediction::{
        AttributionFactor, ContributingFactor, FactorCategory, FailedItem, ForecastItem,
        ForecastLocation, PredictionResult, TimeseriesItem,
    },
    route::{DepartureOptimization, RouteRisk, RouteSummary, RouteWaypoint, WaypointForecast},
};

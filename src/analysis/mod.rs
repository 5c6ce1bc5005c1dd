// Feature construction, explanation and route analysis
mod explainability;
mod feature_builder;
mod holidays;
mod recommendations;
mod route_simulator;
mod spatial_temporal;

pub mod insights;

pub use {
    explainability::ExplainabilityModule,
    feature_builder::FeatureBuilder,
    holidays::{is_us_federal_holiday, us_federal_holidays},
    insights::Insights,
    recommendations::RecommendationGenerator,
    route_simulator::{RouteSimulator, WaypointScorer},
    spatial_temporal::SpatialTemporalEncoder,
};

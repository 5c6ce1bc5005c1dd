mod artifact_io;
mod provider;
mod weather_cache;

pub use {
    artifact_io::{load_artifact, read_artifact_file, save_artifact},
    provider::{OPENWEATHER_URL, OpenWeatherProvider, WeatherProvider},
    weather_cache::WeatherCache,
};

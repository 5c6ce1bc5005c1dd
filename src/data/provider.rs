use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::constants::weather::{
    DEFAULT_HUMIDITY_PCT, DEFAULT_PRECIPITATION_MM, DEFAULT_TEMPERATURE_C,
    DEFAULT_VISIBILITY_KM,
};
use crate::domain::{Location, WeatherSnapshot};

/// Abstract interface for fetching current weather.
/// The engine bounds every call with its own timeout.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, location: Location) -> Result<WeatherSnapshot>;
}

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current conditions from OpenWeather, metric units.
pub struct OpenWeatherProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENWEATHER_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, location: Location) -> Result<WeatherSnapshot> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("weather request for {} failed", location))?;

        if !response.status().is_success() {
            bail!("weather provider HTTP {}", response.status());
        }

        let body: OpenWeatherResponse = response
            .json()
            .await
            .context("malformed weather response")?;
        Ok(body.into())
    }
}

#[derive(Debug, Default, Deserialize)]
struct OpenWeatherResponse {
    main: Option<OwMain>,
    rain: Option<OwRain>,
    /// metres
    visibility: Option<f64>,
    wind: Option<OwWind>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    /// m/s
    speed: Option<f64>,
}

impl From<OpenWeatherResponse> for WeatherSnapshot {
    fn from(r: OpenWeatherResponse) -> Self {
        let main = r.main.unwrap_or_default();
        WeatherSnapshot {
            temperature: main.temp.unwrap_or(DEFAULT_TEMPERATURE_C),
            precipitation: r
                .rain
                .and_then(|rain| rain.one_hour)
                .unwrap_or(DEFAULT_PRECIPITATION_MM),
            visibility: r
                .visibility
                .map(|m| m / 1000.0)
                .unwrap_or(DEFAULT_VISIBILITY_KM),
            // A missing wind block means calm air, not the neutral default.
            wind_speed: r.wind.and_then(|w| w.speed).unwrap_or(0.0) * 3.6,
            humidity: main.humidity.unwrap_or(DEFAULT_HUMIDITY_PCT),
            fetched_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_model_units() {
        let body = r#"{
            "main": {"temp": -2.5, "humidity": 81},
            "visibility": 3500,
            "wind": {"speed": 5.0},
            "rain": {"1h": 6.2}
        }"#;
        let parsed: OpenWeatherResponse = serde_json::from_str(body).unwrap();
        let w = WeatherSnapshot::from(parsed);
        assert_eq!(w.temperature, -2.5);
        assert_eq!(w.humidity, 81.0);
        assert_eq!(w.visibility, 3.5);
        assert_eq!(w.wind_speed, 18.0);
        assert_eq!(w.precipitation, 6.2);
    }

    #[test]
    fn missing_blocks_fall_back() {
        let parsed: OpenWeatherResponse = serde_json::from_str("{}").unwrap();
        let w = WeatherSnapshot::from(parsed);
        assert_eq!(w.temperature, 20.0);
        assert_eq!(w.precipitation, 0.0);
        assert_eq!(w.visibility, 10.0);
        assert_eq!(w.wind_speed, 0.0);
        assert_eq!(w.humidity, 50.0);
    }
}

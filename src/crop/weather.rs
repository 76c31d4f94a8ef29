//! Current temperature lookup (OpenWeatherMap compatible)

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

/// Client for `GET {base_url}/weather`
#[derive(Clone, Debug)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    /// Create a client, or `None` when no API key is configured
    pub fn from_config(config: &WeatherConfig) -> AppResult<Option<Self>> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build weather client: {}", e)))?;

        Ok(Some(Self {
            http,
            base_url: config.base_url().to_string(),
            api_key: api_key.to_string(),
        }))
    }

    /// Current temperature in °C at the given coordinates, rounded
    pub async fn current_temperature(&self, lat: f64, lon: f64) -> AppResult<f64> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Weather API returned status {}",
                response.status()
            )));
        }

        let weather: CurrentWeather = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid weather response: {}", e)))?;

        Ok(weather.main.temp.round())
    }
}

//! Configuration management for agrirelay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section has defaults, so an empty file (or no file at all) yields a
//! config pointing at a local generation server. Environment variables are
//! applied on top of the parsed file.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding `generation.base_url`
pub const ENV_GENERATION_BASE_URL: &str = "GENERATION_BASE_URL";
/// Environment variable overriding `generation.model`
pub const ENV_GENERATION_MODEL: &str = "GENERATION_MODEL";
/// Environment variable overriding `crop.model_url`
pub const ENV_CROP_MODEL_URL: &str = "CROP_MODEL_URL";
/// Environment variable overriding `weather.api_key`
pub const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";

/// Upper bound for every timeout setting, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub crop: CropConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub mandi: MandiConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Text-generation upstream configuration
///
/// The system prompt is deliberately absent: it is a fixed constant of the
/// relay, not something deployments tune.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_base_url")]
    base_url: String,
    #[serde(default = "default_generation_model")]
    model: String,
    /// Time allowed to establish the upstream connection
    #[serde(default = "default_connect_timeout")]
    connect_timeout_seconds: u64,
    /// Total time allowed for non-streaming generations. Streaming relays
    /// have no total timeout.
    #[serde(default = "default_request_timeout")]
    request_timeout_seconds: u64,
}

impl GenerationConfig {
    /// Get the upstream base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the model identifier sent with every generation request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get the total timeout for non-streaming generations
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_generation_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generation_model() -> String {
    "llama3".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    60
}

/// Crop classification model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CropConfig {
    /// Full URL of the classifier; requests fail with a config error when unset
    #[serde(default)]
    model_url: Option<String>,
    #[serde(default = "default_crop_timeout")]
    timeout_seconds: u64,
}

impl CropConfig {
    /// Get the crop model URL, if configured
    pub fn model_url(&self) -> Option<&str> {
        self.model_url.as_deref()
    }

    /// Get the classifier call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            model_url: None,
            timeout_seconds: default_crop_timeout(),
        }
    }
}

fn default_crop_timeout() -> u64 {
    10
}

/// Weather API configuration (OpenWeatherMap compatible)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    base_url: String,
    /// Without a key, temperature lookups are skipped
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_weather_timeout")]
    timeout_seconds: u64,
}

impl WeatherConfig {
    /// Get the weather API base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the API key; empty keys count as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Get the lookup timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
            timeout_seconds: default_weather_timeout(),
        }
    }
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_timeout() -> u64 {
    5
}

/// Market price report configuration (agmarknet compatible)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MandiConfig {
    /// Full URL of the datewise price report endpoint
    #[serde(default = "default_mandi_price_url")]
    price_url: String,
    #[serde(default = "default_mandi_timeout")]
    timeout_seconds: u64,
}

impl MandiConfig {
    /// Get the price report URL
    pub fn price_url(&self) -> &str {
        &self.price_url
    }

    /// Get the report call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for MandiConfig {
    fn default() -> Self {
        Self {
            price_url: default_mandi_price_url(),
            timeout_seconds: default_mandi_timeout(),
        }
    }
}

fn default_mandi_price_url() -> String {
    "https://agmarknet.gov.in/PriceAndArrivals/DatewiseCommodityReport.aspx/GetPriceData"
        .to_string()
}

fn default_mandi_timeout() -> u64 {
    15
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Environment overrides are applied before validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config.apply_env_overrides();

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults
    ///
    /// Either way the environment overrides are applied and the result is
    /// validated.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        if path.as_ref().exists() {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup
    ///
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(ENV_GENERATION_BASE_URL) {
            self.generation.base_url = base_url;
        }
        if let Some(model) = get(ENV_GENERATION_MODEL) {
            self.generation.model = model;
        }
        if let Some(model_url) = get(ENV_CROP_MODEL_URL) {
            self.crop.model_url = Some(model_url);
        }
        if let Some(api_key) = get(ENV_OPENWEATHER_API_KEY) {
            self.weather.api_key = Some(api_key);
        }
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `load()`, but can also be called explicitly
    /// when constructing Config via other means (e.g., in tests).
    pub fn validate(&self) -> AppResult<()> {
        validate_url("generation.base_url", &self.generation.base_url)?;
        validate_url("weather.base_url", &self.weather.base_url)?;
        validate_url("mandi.price_url", &self.mandi.price_url)?;
        if let Some(model_url) = &self.crop.model_url {
            validate_url("crop.model_url", model_url)?;
        }

        if self.generation.model.trim().is_empty() {
            return Err(AppError::Config(
                "generation.model cannot be empty".to_string(),
            ));
        }

        for (name, seconds) in [
            (
                "generation.connect_timeout_seconds",
                self.generation.connect_timeout_seconds,
            ),
            (
                "generation.request_timeout_seconds",
                self.generation.request_timeout_seconds,
            ),
            ("crop.timeout_seconds", self.crop.timeout_seconds),
            ("weather.timeout_seconds", self.weather.timeout_seconds),
            ("mandi.timeout_seconds", self.mandi.timeout_seconds),
        ] {
            if seconds == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0, got {}",
                    name, seconds
                )));
            }
            if seconds > MAX_TIMEOUT_SECONDS {
                return Err(AppError::Config(format!(
                    "{} cannot exceed {} seconds, got {}",
                    name, MAX_TIMEOUT_SECONDS, seconds
                )));
            }
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> AppResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::Config(format!(
            "{} has invalid value '{}'. It must start with 'http://' or 'https://'.",
            field, url
        )));
    }
    Ok(())
}

impl FromStr for Config {
    type Err = AppError;

    /// Parse and validate without consulting the environment
    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

//! HTTP request handlers for the agrirelay API

use crate::config::Config;
use crate::crop::{CropAdvisor, CropClassifier, HttpCropClassifier, WeatherClient};
use crate::error::{AppError, AppResult};
use crate::generation::GenerationClient;
use crate::mandi::MandiClient;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::relay::{Relay, SYSTEM_PROMPT};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod mandi_prices;
pub mod metrics;
pub mod predict_crop;

/// Application state shared across all handlers
///
/// All fields are Arc'd (or cheap clones) for cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Metrics,
    relay: Arc<Relay>,
    advisor: Arc<CropAdvisor>,
    mandi: MandiClient,
}

impl AppState {
    /// Create a new AppState from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client or the metrics registry cannot be built.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to create metrics: {}", e)))?;

        let generation = GenerationClient::new(&config.generation)?;
        let classifier = HttpCropClassifier::new(config.crop.model_url(), config.crop.timeout())?;
        let weather = WeatherClient::from_config(&config.weather)?;
        let mandi = MandiClient::from_config(&config.mandi)?;

        let relay = Relay::new(generation.clone(), SYSTEM_PROMPT, metrics.clone());
        let advisor = CropAdvisor::new(Arc::new(classifier), weather, generation, metrics.clone());

        Ok(Self {
            config,
            metrics,
            relay: Arc::new(relay),
            advisor: Arc::new(advisor),
            mandi,
        })
    }

    /// Replace the crop classifier (used to plug in other model backends)
    pub fn with_crop_classifier(mut self, classifier: Arc<dyn CropClassifier>) -> Self {
        let advisor = self.advisor.as_ref().clone().with_classifier(classifier);
        self.advisor = Arc::new(advisor);
        self
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get reference to the chat relay
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Get reference to the crop advisor
    pub fn advisor(&self) -> &CropAdvisor {
        &self.advisor
    }

    /// Get reference to the market price client
    pub fn mandi(&self) -> &MandiClient {
        &self.mandi
    }
}

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::handler))
        .route("/predict-crop", post(predict_crop::handler))
        .route("/mandi-prices", get(mandi_prices::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

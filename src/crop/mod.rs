//! Crop prediction
//!
//! Completes a partial soil reading, asks the crop classifier for a crop and
//! the generation endpoint for a short explanation. Every external call has
//! a single fallback except the classifier configuration itself.

pub mod classifier;
pub mod images;
pub mod soil;
pub mod weather;

pub use classifier::{CropClassifier, FALLBACK_CROPS, HttpCropClassifier};
pub use images::image_url_for;
pub use soil::{PartialSoilReading, SoilReading};
pub use weather::WeatherClient;

use crate::error::{AppError, AppResult};
use crate::generation::GenerationClient;
use crate::metrics::{Metrics, PredictionSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /predict-crop`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictCropRequest {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub soil_data: Option<PartialSoilReading>,
}

impl PredictCropRequest {
    /// Coordinates usable for a weather lookup (both present and non-zero)
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Answer of `POST /predict-crop`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictCropResponse {
    pub predicted_crop: String,
    pub explanation: String,
    pub soil_data: SoilReading,
    pub image_url: String,
}

/// Orchestrates a crop prediction
#[derive(Clone)]
pub struct CropAdvisor {
    classifier: Arc<dyn CropClassifier>,
    weather: Option<WeatherClient>,
    generation: GenerationClient,
    metrics: Metrics,
}

impl CropAdvisor {
    /// Create an advisor
    pub fn new(
        classifier: Arc<dyn CropClassifier>,
        weather: Option<WeatherClient>,
        generation: GenerationClient,
        metrics: Metrics,
    ) -> Self {
        Self {
            classifier,
            weather,
            generation,
            metrics,
        }
    }

    /// Replace the classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn CropClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Predict a crop for the request
    ///
    /// # Errors
    ///
    /// `AppError::Config` when no classifier is configured. All other
    /// failures degrade to fallbacks.
    pub async fn predict(&self, request: &PredictCropRequest) -> AppResult<PredictCropResponse> {
        let partial = request.soil_data.unwrap_or_default();

        let temperature = match partial.known_temperature() {
            Some(temperature) => temperature,
            None => self.lookup_temperature(request.coordinates()).await,
        };
        let soil = partial.complete(temperature, &mut rand::rng());

        let predicted_crop = match self.classifier.classify(&soil).await {
            Ok(crop) => {
                self.metrics.crop_prediction(PredictionSource::Model);
                crop
            }
            Err(e @ AppError::Config(_)) => return Err(e),
            Err(e) => {
                let crop = classifier::choose_fallback(&mut rand::rng()).to_string();
                tracing::warn!(
                    error = %e,
                    soil = ?soil,
                    fallback_crop = %crop,
                    "Crop model failed, using fallback crop"
                );
                self.metrics.crop_prediction(PredictionSource::Fallback);
                crop
            }
        };

        let explanation = self.explain(&predicted_crop, &soil).await;
        let image_url = image_url_for(&predicted_crop).to_string();

        Ok(PredictCropResponse {
            predicted_crop,
            explanation,
            soil_data: soil,
            image_url,
        })
    }

    async fn lookup_temperature(&self, coordinates: Option<(f64, f64)>) -> f64 {
        if let (Some(weather), Some((lat, lon))) = (&self.weather, coordinates) {
            match weather.current_temperature(lat, lon).await {
                Ok(temperature) => return temperature,
                Err(e) => {
                    tracing::warn!(error = %e, lat, lon, "Weather lookup failed, using random temperature");
                }
            }
        }
        soil::random_temperature(&mut rand::rng())
    }

    async fn explain(&self, crop: &str, soil: &SoilReading) -> String {
        let prompt = explanation_prompt(crop, soil);
        match self.generation.generate(&prompt, None).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, crop = %crop, "Explanation unavailable");
                format!(
                    "The predicted crop is {}. It is suitable for your soil conditions. (AI explanation unavailable)",
                    crop
                )
            }
        }
    }
}

/// Prompt asking for a short note about growing `crop` under `soil`
pub fn explanation_prompt(crop: &str, soil: &SoilReading) -> String {
    format!(
        "You are an agricultural expert. The predicted crop for a farm with the following conditions is {crop}.
Conditions:
- Nitrogen (N): {n}
- Phosphorus (P): {p}
- Potassium (K): {k}
- Temperature: {temp}°C
- pH: {ph}
- Rainfall: {rain}mm

Write a short, encouraging note (at most 3-4 sentences) for the farmer about growing {crop} under these conditions, including one brief tip. Reply with the note only.",
        n = soil.nitrogen,
        p = soil.phosphorus,
        k = soil.potassium,
        temp = soil.temperature,
        ph = soil.ph,
        rain = soil.rainfall,
    )
}

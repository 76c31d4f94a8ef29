//! Crop prediction endpoint handler

use crate::crop::{PredictCropRequest, PredictCropResponse};
use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State};

/// POST /predict-crop handler
///
/// Missing soil values are filled in, so `{}` is a valid request.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<PredictCropRequest>,
) -> Result<Json<PredictCropResponse>, AppError> {
    tracing::info!(
        request_id = %request_id,
        has_coordinates = request.coordinates().is_some(),
        has_soil_data = request.soil_data.is_some(),
        "Received crop prediction request"
    );

    let response = state.advisor().predict(&request).await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Crop prediction failed");
    })?;

    tracing::info!(
        request_id = %request_id,
        predicted_crop = %response.predicted_crop,
        "Crop prediction completed"
    );

    Ok(Json(response))
}

//! JSON extractor with `{"error": ...}` rejections
//!
//! Wraps Axum's `Json` extractor so that every body problem (bad syntax,
//! failed validation, wrong content type) becomes `AppError::Validation`,
//! answered as `400 {"error": "..."}` like any other invalid request.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

/// Convert an Axum JSON rejection into a validation error
pub fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        _ => rejection.body_text(),
    };
    AppError::Validation(message)
}

/// Custom JSON extractor producing `AppError` rejections
///
/// Handlers that need to observe the rejection (for metrics) can take
/// `Result<ApiJson<T>, AppError>` instead.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

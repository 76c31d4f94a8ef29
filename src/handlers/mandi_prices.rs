//! Market price endpoint handler

use crate::error::AppError;
use crate::handlers::AppState;
use crate::mandi::{MandiPricesResponse, MandiQuery};
use crate::middleware::RequestId;
use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
};

/// GET /mandi-prices handler
///
/// Requires `commodity`, `state`, `district`, `market`, `fromDate` and
/// `toDate`; answers `{"records": [...]}` from the price report.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<MandiQuery>, QueryRejection>,
) -> Result<Json<MandiPricesResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = query.validate()?;

    tracing::info!(
        request_id = %request_id,
        commodity = %request.commodity,
        market = %request.market,
        "Fetching mandi prices"
    );

    let response = state.mandi().prices(&request).await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Mandi price lookup failed");
    })?;

    Ok(Json(response))
}

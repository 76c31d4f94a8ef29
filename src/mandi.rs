//! Market (mandi) price lookup
//!
//! Proxies the agmarknet datewise commodity report. The report answers
//! `{"d": [...]}`; the records are passed through untouched.

use crate::config::MandiConfig;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Query of `GET /mandi-prices`
///
/// Fields are optional so that a missing one is reported as a 400 by
/// [`MandiQuery::validate`] rather than as a query rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MandiQuery {
    pub commodity: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// A complete price report request, forwarded as the report's JSON body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceReportRequest {
    pub commodity: String,
    pub state: String,
    pub district: String,
    pub market: String,
    pub from_date: String,
    pub to_date: String,
}

impl MandiQuery {
    /// Require every parameter to be present and non-blank
    ///
    /// # Errors
    ///
    /// `AppError::Validation("Missing required query parameters")`
    pub fn validate(self) -> AppResult<PriceReportRequest> {
        fn required(value: Option<String>) -> AppResult<String> {
            value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                AppError::Validation("Missing required query parameters".to_string())
            })
        }

        Ok(PriceReportRequest {
            commodity: required(self.commodity)?,
            state: required(self.state)?,
            district: required(self.district)?,
            market: required(self.market)?,
            from_date: required(self.from_date)?,
            to_date: required(self.to_date)?,
        })
    }
}

/// Answer of `GET /mandi-prices`
#[derive(Debug, Clone, Serialize)]
pub struct MandiPricesResponse {
    pub records: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PriceReport {
    #[serde(default)]
    d: serde_json::Value,
}

/// Client for the datewise price report
#[derive(Clone, Debug)]
pub struct MandiClient {
    http: reqwest::Client,
    price_url: String,
}

impl MandiClient {
    /// Create a client from configuration
    pub fn from_config(config: &MandiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build mandi client: {}", e)))?;

        Ok(Self {
            http,
            price_url: config.price_url().to_string(),
        })
    }

    /// Fetch the price records for `request`
    ///
    /// # Errors
    ///
    /// `AppError::Internal` when the report cannot be reached, answers with a
    /// non-success status, or is not JSON.
    pub async fn prices(&self, request: &PriceReportRequest) -> AppResult<MandiPricesResponse> {
        let response = self
            .http
            .post(&self.price_url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch data: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "Failed to fetch data: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let report: PriceReport = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid price report: {}", e)))?;

        Ok(MandiPricesResponse { records: report.d })
    }
}

//! Forecast client
//!
//! Fetches a forecast document for a coordinate pair and extracts the first
//! daily daylight-duration value. The rest of the document is passed
//! through verbatim so the response shape follows the upstream service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::WeathervaneError;
use crate::models::ForecastResult;

/// Contract for fetching forecast data by coordinates
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch the forecast for a coordinate pair.
    ///
    /// A non-2xx upstream response or transport failure is surfaced as an
    /// upstream error carrying the status code (500 when unreachable).
    async fn fetch(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<ForecastResult, WeathervaneError>;
}

/// The slice of the forecast document this service interprets
#[derive(Debug, Deserialize)]
struct DailySeries {
    daylight_duration: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastDocument {
    daily: DailySeries,
}

/// HTTP client for the forecast endpoint
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    /// Create a client against the given forecast endpoint base URL.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be initialized.
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, WeathervaneError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WeathervaneError::config(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn forecast_url(&self, latitude: &str, longitude: &str) -> String {
        format!(
            "{}?latitude={}&longitude={}",
            self.base_url,
            urlencoding::encode(latitude),
            urlencoding::encode(longitude)
        )
    }
}

/// Pull `daily.daylight_duration[0]` out of a forecast document.
///
/// The value is required: a document without it cannot be shaped into a
/// response, which counts as an upstream failure.
fn extract_daylight_duration(raw: &serde_json::Value) -> Result<f64, WeathervaneError> {
    let document: ForecastDocument = serde_json::from_value(raw.clone()).map_err(|e| {
        WeathervaneError::upstream(500, format!("Malformed forecast response: {e}"))
    })?;

    document.daily.daylight_duration.first().copied().ok_or_else(|| {
        WeathervaneError::upstream(500, "Forecast response contains no daylight duration")
    })
}

#[async_trait]
impl ForecastProvider for ForecastClient {
    #[instrument(skip(self))]
    async fn fetch(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<ForecastResult, WeathervaneError> {
        let url = self.forecast_url(latitude, longitude);
        debug!(url = %url, "Fetching forecast data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeathervaneError::upstream(500, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeathervaneError::upstream(
                status.as_u16(),
                "Failed to fetch forecast data",
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WeathervaneError::upstream(500, e.to_string()))?;

        let daylight_duration_seconds = extract_daylight_duration(&raw)?;

        Ok(ForecastResult {
            daylight_duration_seconds,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_forecast_url_carries_coordinates() {
        let client = ForecastClient::new("http://forecast:9090/forecast".into(), 30).unwrap();
        assert_eq!(
            client.forecast_url("52.52", "13.405"),
            "http://forecast:9090/forecast?latitude=52.52&longitude=13.405"
        );
    }

    #[test]
    fn test_extract_daylight_duration() {
        let raw = json!({
            "daily": {
                "time": ["2024-01-15"],
                "daylight_duration": [28800.5, 28900.0]
            }
        });
        let seconds = extract_daylight_duration(&raw).unwrap();
        assert!((seconds - 28800.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extract_daylight_duration_missing_series() {
        let raw = json!({ "daily": { "time": [] } });
        let err = extract_daylight_duration(&raw).unwrap_err();
        assert!(matches!(
            err,
            WeathervaneError::Upstream { status: 500, .. }
        ));
    }

    #[test]
    fn test_extract_daylight_duration_empty_series() {
        let raw = json!({ "daily": { "daylight_duration": [] } });
        let err = extract_daylight_duration(&raw).unwrap_err();
        assert!(matches!(
            err,
            WeathervaneError::Upstream { status: 500, .. }
        ));
    }
}

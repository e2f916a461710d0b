//! Geocoding client for Nominatim-style search APIs
//!
//! Resolves a free-text "{city},{country}" query into a ranked list of
//! candidate address records. Upstream ranking order is preserved; no
//! retries are attempted.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::WeathervaneError;
use crate::models::GeocodeCandidate;

/// User agent sent with every geocoding request; Nominatim rejects
/// requests without one.
const USER_AGENT: &str = concat!("weathervane/", env!("CARGO_PKG_VERSION"));

/// Contract for resolving a city/country pair into candidate records
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a city/country pair into an ordered candidate list.
    ///
    /// A non-2xx upstream response or transport failure is surfaced as an
    /// upstream error carrying the status code (500 when unreachable).
    async fn resolve(
        &self,
        city: &str,
        country: &str,
    ) -> Result<Vec<GeocodeCandidate>, WeathervaneError>;
}

/// HTTP client for a Nominatim-compatible search endpoint
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    /// Create a client against the given search endpoint base URL.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be initialized.
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, WeathervaneError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WeathervaneError::config(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn search_url(&self, city: &str, country: &str) -> String {
        format!(
            "{}?format=json&q={}",
            self.base_url,
            urlencoding::encode(&format!("{city},{country}"))
        )
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self))]
    async fn resolve(
        &self,
        city: &str,
        country: &str,
    ) -> Result<Vec<GeocodeCandidate>, WeathervaneError> {
        let url = self.search_url(city, country);
        debug!(url = %url, "Resolving coordinates via geocoding service");

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
                "Failed to resolve coordinates",
            ));
        }

        let candidates: Vec<GeocodeCandidate> = response
            .json()
            .await
            .map_err(|e| WeathervaneError::upstream(500, e.to_string()))?;

        debug!(count = candidates.len(), "Geocoding candidates received");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let client =
            NominatimClient::new("https://nominatim.openstreetmap.org/search".into(), 30).unwrap();
        let url = client.search_url("New York", "us");
        assert_eq!(
            url,
            "https://nominatim.openstreetmap.org/search?format=json&q=New%20York%2Cus"
        );
    }

    #[test]
    fn test_candidate_deserialization_tolerates_missing_tags() {
        let json = r#"[{"lat": "52.52", "lon": "13.405", "display_name": "Berlin"}]"#;
        let candidates: Vec<GeocodeCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].addresstype, "");
        assert_eq!(candidates[0].lat, "52.52");
    }
}

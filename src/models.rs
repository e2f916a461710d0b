//! Request and domain models for coordinate resolution

use serde::{Deserialize, Serialize};

use crate::error::WeathervaneError;

/// Escape HTML-unsafe characters in a path segment.
///
/// Inputs are escaped before any further use so they are safe to echo back
/// in response bodies. This defends rendering only; queries use bound
/// parameters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A city/country pair as provided by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    pub country: String,
}

impl LocationQuery {
    /// Build a query from raw path segments, escaping them first.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either segment is empty after escaping.
    pub fn parse(city: &str, country: &str) -> Result<Self, WeathervaneError> {
        let city = escape_html(city);
        let country = escape_html(country);
        if city.is_empty() || country.is_empty() {
            return Err(WeathervaneError::validation(
                "Location and country are required",
            ));
        }
        Ok(Self { city, country })
    }
}

/// A latitude/longitude pair, kept as decimal-string text end to end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    /// Build coordinates from raw path segments, escaping them first.
    ///
    /// No numeric validation is performed; the forecast service is the
    /// authority on what it accepts.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either segment is empty after escaping.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, WeathervaneError> {
        let latitude = escape_html(latitude);
        let longitude = escape_html(longitude);
        if latitude.is_empty() || longitude.is_empty() {
            return Err(WeathervaneError::validation(
                "Latitude and longitude are required",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A single geocoding search result with its address classification tag
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub addresstype: String,
    pub lat: String,
    pub lon: String,
}

/// One selectable city presented to the caller when disambiguation
/// cannot pick a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityOption {
    /// 1-based position in the working set
    pub index: String,
    /// Upstream display name
    pub name: String,
    /// Link to the coordinates endpoint for this candidate
    pub link: String,
}

/// Forecast data for a coordinate pair
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Daylight duration in seconds for the first forecast day
    pub daylight_duration_seconds: f64,
    /// Full upstream forecast document, passed through verbatim
    pub raw: serde_json::Value,
}

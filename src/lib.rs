//! Weathervane - city-to-coordinates resolution and weather forecasts
//!
//! This library resolves a city/country name to geographic coordinates,
//! caches the mapping in PostgreSQL, and fetches a weather forecast for
//! the resolved coordinates, disambiguating when the geocoding service
//! returns more than one plausible match.

pub mod config;
pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod models;
pub mod resolve;
pub mod store;
pub mod telemetry;
pub mod web;

// Re-export core types for the public API
pub use config::WeathervaneConfig;
pub use error::WeathervaneError;
pub use forecast::{ForecastClient, ForecastProvider};
pub use geocoding::{Geocoder, NominatimClient};
pub use models::{CityOption, Coordinates, GeocodeCandidate, LocationQuery};
pub use resolve::{ResolutionWorkflow, ShapedForecast, WeatherResponse};
pub use store::{CacheLookup, CoordinateStore, PgCoordinateStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeathervaneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

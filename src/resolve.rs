//! Coordinate resolution and disambiguation workflow
//!
//! Orchestrates the store lookup, geocoding fallback, candidate
//! disambiguation and forecast fetch for one request:
//!
//! check cache -> (hit: fetch forecast | miss: geocode) -> disambiguate
//! -> (single match: fetch forecast | multiple: return choices)
//!
//! Cache hits are trusted blindly; a store that cannot answer is treated
//! as a miss by policy and the failure is only logged.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::WeathervaneError;
use crate::forecast::ForecastProvider;
use crate::geocoding::Geocoder;
use crate::models::{CityOption, Coordinates, GeocodeCandidate, LocationQuery};
use crate::store::{CacheLookup, CoordinateStore};

/// Forecast response shaped for the caller
#[derive(Debug, Clone, Serialize)]
pub struct ShapedForecast {
    pub latitude: String,
    pub longitude: String,
    /// Daylight duration formatted as "{hours}h {minutes}min"
    pub daylight_duration: String,
    /// Upstream forecast document, verbatim
    pub forecast: serde_json::Value,
}

/// The two non-error outcomes a resolution can produce
#[derive(Debug, Clone)]
pub enum WeatherResponse {
    /// Resolution narrowed to one coordinate pair and a forecast was fetched
    Forecast(ShapedForecast),
    /// Disambiguation needs the caller to choose; re-invoke with explicit
    /// coordinates via the option links
    MultipleMatches(Vec<CityOption>),
}

/// Convert a daylight duration in seconds to an "{hours}h {minutes}min"
/// display string. Seconds precision is discarded.
///
/// Negative or non-finite input has no meaning for a daylight duration and
/// is clamped to zero rather than floor-divided.
#[must_use]
pub fn convert_daylight_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds >= 0.0 {
        seconds as u64
    } else {
        warn!(seconds, "Clamping unusable daylight duration to zero");
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    format!("{hours}h {minutes}min")
}

/// Narrow a ranked candidate list to the working set.
///
/// Two-tier substring filter, first match wins: address types containing
/// "city", then address types containing "municipality". Upstream order is
/// preserved within a tier.
fn filter_candidates(
    candidates: Vec<GeocodeCandidate>,
) -> Result<Vec<GeocodeCandidate>, WeathervaneError> {
    let cities: Vec<GeocodeCandidate> = candidates
        .iter()
        .filter(|c| c.addresstype.contains("city"))
        .cloned()
        .collect();
    if !cities.is_empty() {
        return Ok(cities);
    }

    let municipalities: Vec<GeocodeCandidate> = candidates
        .into_iter()
        .filter(|c| c.addresstype.contains("municipality"))
        .collect();
    if !municipalities.is_empty() {
        return Ok(municipalities);
    }

    Err(WeathervaneError::not_found(
        "No cities or municipalities found for the given location",
    ))
}

/// Orchestrates one resolution request end to end.
///
/// Collaborators are injected as capabilities at construction; the
/// workflow holds no other state.
pub struct ResolutionWorkflow {
    store: Arc<dyn CoordinateStore>,
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastProvider>,
    /// Base URL used to build the links in a disambiguation response
    public_base_url: String,
}

impl ResolutionWorkflow {
    #[must_use]
    pub fn new(
        store: Arc<dyn CoordinateStore>,
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastProvider>,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            geocoder,
            forecast,
            public_base_url,
        }
    }

    /// Resolve a city/country query to a shaped forecast or a choice list.
    #[instrument(skip_all, fields(city = %query.city, country = %query.country))]
    pub async fn resolve_by_name(
        &self,
        query: &LocationQuery,
    ) -> Result<WeatherResponse, WeathervaneError> {
        info!("Received request to get weather data");

        match self.store.lookup(&query.city, &query.country).await {
            CacheLookup::Found(coordinates) => {
                debug!("Coordinates found in store, skipping geocoding");
                self.fetch_forecast(&coordinates).await
            }
            CacheLookup::Absent => self.geocode_and_disambiguate(query).await,
            CacheLookup::Unavailable(reason) => {
                // Deliberate policy: an unreachable store behaves like a miss
                warn!(%reason, "Coordinate store unavailable, treating as cache miss");
                self.geocode_and_disambiguate(query).await
            }
        }
    }

    /// Fetch and shape the forecast for explicit coordinates.
    #[instrument(skip_all, fields(lat = %coordinates.latitude, lon = %coordinates.longitude))]
    pub async fn resolve_by_coordinates(
        &self,
        coordinates: &Coordinates,
    ) -> Result<ShapedForecast, WeathervaneError> {
        info!("Received request to get weather data by coordinates");
        match self.fetch_forecast(coordinates).await? {
            WeatherResponse::Forecast(shaped) => Ok(shaped),
            // fetch_forecast never produces a choice list
            WeatherResponse::MultipleMatches(_) => Err(WeathervaneError::upstream(
                500,
                "Unexpected disambiguation response",
            )),
        }
    }

    async fn geocode_and_disambiguate(
        &self,
        query: &LocationQuery,
    ) -> Result<WeatherResponse, WeathervaneError> {
        let candidates = self.geocoder.resolve(&query.city, &query.country).await?;
        let working_set = filter_candidates(candidates)?;

        // Persist every working-set candidate before selection. This is a
        // deliberate side effect: the next lookup for this query hits the
        // cache no matter which candidate the caller ends up choosing.
        for candidate in &working_set {
            if let Err(err) = self
                .store
                .insert(&query.city, &query.country, &candidate.lat, &candidate.lon)
                .await
            {
                warn!(error = %err, "Failed to persist candidate coordinates");
            }
        }

        if working_set.len() == 1 {
            let selected = &working_set[0];
            let coordinates = Coordinates {
                latitude: selected.lat.clone(),
                longitude: selected.lon.clone(),
            };
            return self.fetch_forecast(&coordinates).await;
        }

        info!(
            count = working_set.len(),
            "Multiple cities found for the given location"
        );
        Ok(WeatherResponse::MultipleMatches(
            self.city_options(&working_set),
        ))
    }

    fn city_options(&self, working_set: &[GeocodeCandidate]) -> Vec<CityOption> {
        working_set
            .iter()
            .enumerate()
            .map(|(index, candidate)| CityOption {
                index: (index + 1).to_string(),
                name: candidate.display_name.clone(),
                link: format!(
                    "{}/weather/coordinates/{}/{}",
                    self.public_base_url, candidate.lat, candidate.lon
                ),
            })
            .collect()
    }

    async fn fetch_forecast(
        &self,
        coordinates: &Coordinates,
    ) -> Result<WeatherResponse, WeathervaneError> {
        let result = self
            .forecast
            .fetch(&coordinates.latitude, &coordinates.longitude)
            .await?;

        Ok(WeatherResponse::Forecast(ShapedForecast {
            latitude: coordinates.latitude.clone(),
            longitude: coordinates.longitude.clone(),
            daylight_duration: convert_daylight_duration(result.daylight_duration_seconds),
            forecast: result.raw,
        }))
    }
}

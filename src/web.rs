//! HTTP surface for the weathervane service
//!
//! Routes path segments into the resolution workflow and renders its
//! tagged response variants as JSON. All error conversion happens in
//! `WeathervaneError::into_response`; handlers never produce raw faults.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::WeathervaneError;
use crate::models::{Coordinates, LocationQuery};
use crate::resolve::{ResolutionWorkflow, WeatherResponse};

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ResolutionWorkflow>,
}

/// Build the service router
pub fn router(workflow: Arc<ResolutionWorkflow>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/weather/{location}/{country}", get(get_weather))
        .route(
            "/weather/coordinates/{latitude}/{longitude}",
            get(get_weather_by_coordinates),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { workflow })
}

/// Bind and serve until the process is stopped
pub async fn run(workflow: Arc<ResolutionWorkflow>, port: u16) -> anyhow::Result<()> {
    let app = router(workflow);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Weather service listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_weather(
    State(state): State<AppState>,
    Path((location, country)): Path<(String, String)>,
) -> Result<Response, WeathervaneError> {
    let query = LocationQuery::parse(&location, &country)?;
    let response = state.workflow.resolve_by_name(&query).await?;
    Ok(render(response))
}

async fn get_weather_by_coordinates(
    State(state): State<AppState>,
    Path((latitude, longitude)): Path<(String, String)>,
) -> Result<Response, WeathervaneError> {
    let coordinates = Coordinates::parse(&latitude, &longitude)?;
    let shaped = state.workflow.resolve_by_coordinates(&coordinates).await?;
    Ok((StatusCode::OK, Json(shaped)).into_response())
}

fn render(response: WeatherResponse) -> Response {
    match response {
        WeatherResponse::Forecast(shaped) => (StatusCode::OK, Json(shaped)).into_response(),
        WeatherResponse::MultipleMatches(options) => (
            StatusCode::MULTIPLE_CHOICES,
            Json(json!({ "cities": options })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastProvider;
    use crate::geocoding::Geocoder;
    use crate::models::{ForecastResult, GeocodeCandidate};
    use crate::store::{CacheLookup, CoordinateStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct StubStore;

    #[async_trait]
    impl CoordinateStore for StubStore {
        async fn lookup(&self, _city: &str, _country: &str) -> CacheLookup {
            CacheLookup::Absent
        }

        async fn insert(
            &self,
            _city: &str,
            _country: &str,
            _latitude: &str,
            _longitude: &str,
        ) -> Result<(), WeathervaneError> {
            Ok(())
        }
    }

    struct StubGeocoder {
        candidates: Vec<GeocodeCandidate>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn resolve(
            &self,
            _city: &str,
            _country: &str,
        ) -> Result<Vec<GeocodeCandidate>, WeathervaneError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }
    }

    struct StubForecast;

    #[async_trait]
    impl ForecastProvider for StubForecast {
        async fn fetch(
            &self,
            latitude: &str,
            longitude: &str,
        ) -> Result<ForecastResult, WeathervaneError> {
            Ok(ForecastResult {
                daylight_duration_seconds: 28800.0,
                raw: serde_json::json!({
                    "latitude": latitude,
                    "longitude": longitude,
                    "daily": { "daylight_duration": [28800.0] }
                }),
            })
        }
    }

    fn candidate(addresstype: &str, lat: &str, lon: &str, name: &str) -> GeocodeCandidate {
        GeocodeCandidate {
            display_name: name.to_string(),
            addresstype: addresstype.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }

    fn test_router(candidates: Vec<GeocodeCandidate>) -> Router {
        let workflow = ResolutionWorkflow::new(
            Arc::new(StubStore),
            Arc::new(StubGeocoder {
                candidates,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(StubForecast),
            "http://localhost:8080".to_string(),
        );
        router(Arc::new(workflow))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_single_match_returns_shaped_forecast() {
        let app = test_router(vec![candidate("city", "10", "20", "X")]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/weather/Berlin/de")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["latitude"], "10");
        assert_eq!(body["longitude"], "20");
        assert_eq!(body["daylight_duration"], "8h 0min");
        assert!(body["forecast"]["daily"]["daylight_duration"].is_array());
    }

    #[tokio::test]
    async fn test_multiple_matches_return_choice_list() {
        let app = test_router(vec![
            candidate("city", "1", "2", "First"),
            candidate("city", "3", "4", "Second"),
        ]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/weather/Springfield/us")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MULTIPLE_CHOICES);
        let body = body_json(response).await;
        let cities = body["cities"].as_array().unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0]["index"], "1");
        assert_eq!(
            cities[0]["link"],
            "http://localhost:8080/weather/coordinates/1/2"
        );
        assert_eq!(cities[1]["index"], "2");
    }

    #[tokio::test]
    async fn test_unmatched_addresstype_is_404() {
        let app = test_router(vec![candidate("village", "1", "2", "A")]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/weather/Smallville/us")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("municipalities"));
    }

    #[tokio::test]
    async fn test_coordinates_endpoint_returns_forecast() {
        let app = test_router(vec![]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/weather/coordinates/52.52/13.405")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["latitude"], "52.52");
        assert_eq!(body["daylight_duration"], "8h 0min");
    }

    #[tokio::test]
    async fn test_whitespace_only_segment_is_escaped_then_rejected() {
        // "%3C%3E" decodes to "<>" which escapes to a non-empty string, but
        // a segment consisting only of nothing-after-decode cannot reach the
        // workflow; exercise the validation path via the query parser here
        // and the routing fallback below.
        assert!(LocationQuery::parse("", "de").is_err());

        let app = test_router(vec![]);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/weather//de")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // An empty path segment never matches the route
        assert_ne!(response.status(), StatusCode::OK);
    }
}

//! Error types and handling for the weathervane service

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the weathervane service
#[derive(Error, Debug)]
pub enum WeathervaneError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors (empty location, country or coordinates)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// No usable geocoding candidates after filtering
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// An upstream service returned a non-2xx response or was unreachable
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Coordinate store connectivity or query errors
    #[error("Store error: {message}")]
    Store { message: String },
}

impl WeathervaneError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream error carrying the upstream HTTP status
    pub fn upstream<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// The HTTP status code this error maps to at the boundary
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Config { .. } | Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for WeathervaneError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map_or(500, |s| s.as_u16());
        Self::Upstream {
            status,
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for WeathervaneError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for WeathervaneError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

//! Monitor error types with HTTP status code mapping.
//!
//! [`MonitorError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "no chat events recorded for livestream 9",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation / payload  | 400 Bad Request              |
/// | 2000–2999 | State / Not Found     | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / persistence  | 500 Internal Server Error    |
/// | 4000–4999 | Upstream              | 502 Bad Gateway              |
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Mandatory configuration missing at startup. Fatal.
    #[error("missing required configuration: {0}")]
    ConfigMissing(String),

    /// The solver proxy returned a non-ok or malformed envelope.
    #[error("proxy rejected request: {0}")]
    ProxyRejected(String),

    /// JSON decode, timestamp parse, or identifier parse failure.
    #[error("invalid payload: {0}")]
    PayloadInvalid(String),

    /// A looked-up row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique-constraint violation or concurrent insert.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure other than not-found or conflict.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Chat-transport read/write or dial failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Report requested for a livestream with zero chat events.
    #[error("no chat events recorded for livestream {0}")]
    NoData(i64),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::PayloadInvalid(_) => 1001,
            Self::ConfigMissing(_) => 1002,
            Self::NotFound(_) => 2001,
            Self::NoData(_) => 2002,
            Self::Conflict(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::ProxyRejected(_) => 4001,
            Self::Transport(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadInvalid(_) | Self::ConfigMissing(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NoData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProxyRejected(_) | Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for MonitorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::PayloadInvalid(err.to_string())
    }
}

impl From<chrono::ParseError> for MonitorError {
    fn from(err: chrono::ParseError) -> Self {
        Self::PayloadInvalid(format!("timestamp parse failed: {err}"))
    }
}

impl From<uuid::Error> for MonitorError {
    fn from(err: uuid::Error) -> Self {
        Self::PayloadInvalid(format!("identifier parse failed: {err}"))
    }
}

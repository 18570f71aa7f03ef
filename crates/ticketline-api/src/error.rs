//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use thiserror::Error;
use ticketline_core::envelope::ErrorEnvelope;
use ticketline_core::error::DomainError;

/// Startup and runtime errors for the API servers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Failure from the domain layer during startup.
    #[error("startup error: {0}")]
    Startup(#[from] DomainError),
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_)
            | DomainError::InsufficientSeats { .. }
            | DomainError::EventNotPublished { .. }
            | DomainError::InvalidBookingState(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidState(_) => StatusCode::CONFLICT,
            DomainError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the logs, not on the wire.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
            "An unexpected error occurred".to_owned()
        } else {
            self.0.to_string()
        };

        let body = ErrorEnvelope::new(status.as_u16(), message, Utc::now());
        (status, Json(body)).into_response()
    }
}

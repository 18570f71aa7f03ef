//! HTTP implementations of the cross-service ports.
//!
//! Each client wraps a `reqwest::Client` with a five second timeout and a
//! base URL, and translates remote failures into [`DomainError`] values:
//! 404 becomes `NotFound`, 409 becomes `InvalidState`, any other 4xx becomes
//! `Validation`, and 5xx responses or transport failures (including timeouts)
//! become `ServiceUnavailable`. Error messages are taken from the remote
//! error envelope when one can be parsed.

pub mod booking;
pub mod catalog;

pub use booking::HttpBookingClient;
pub use catalog::HttpCatalogClient;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use ticketline_core::envelope::ErrorEnvelope;
use ticketline_core::error::DomainError;

/// Timeout applied to every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

fn build_client() -> Result<reqwest::Client, DomainError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| DomainError::Internal(format!("failed to build HTTP client: {err}")))
}

/// Maps a transport-level failure to a domain error. Timeouts and connection
/// failures are transient from the caller's perspective.
fn transport_error(service: &str, err: &reqwest::Error) -> DomainError {
    DomainError::ServiceUnavailable(format!("{service} request failed: {err}"))
}

/// Translates a non-success response into a domain error, using the remote
/// error envelope's message when the body parses as one.
async fn classify_error(service: &str, response: Response) -> DomainError {
    let status = response.status();
    let message = response
        .json::<ErrorEnvelope>()
        .await
        .map_or_else(|_| format!("{service} returned {status}"), |env| env.message);

    match status {
        StatusCode::NOT_FOUND => DomainError::NotFound(message),
        StatusCode::CONFLICT => DomainError::InvalidState(message),
        s if s.is_client_error() => DomainError::Validation(message),
        _ => DomainError::ServiceUnavailable(message),
    }
}

/// Decodes a success response body, or classifies the failure.
async fn decode<T: DeserializeOwned>(service: &str, response: Response) -> Result<T, DomainError> {
    if !response.status().is_success() {
        return Err(classify_error(service, response).await);
    }
    response.json::<T>().await.map_err(|err| {
        DomainError::ServiceUnavailable(format!("{service} returned a malformed body: {err}"))
    })
}

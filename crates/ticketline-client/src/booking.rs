//! HTTP client for the booking service.

use async_trait::async_trait;
use serde::Serialize;
use ticketline_core::error::DomainError;
use ticketline_payment::client::{BookingClient, BookingSnapshot};
use uuid::Uuid;

use crate::{build_client, classify_error, decode, transport_error};

const SERVICE: &str = "booking service";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmBookingRequest {
    payment_id: Uuid,
}

/// Talks to the booking service over its REST API.
pub struct HttpBookingClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookingClient {
    /// Creates a client for a booking service rooted at `base_url`
    /// (for example `http://localhost:8081`).
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Internal`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    fn booking_url(&self, booking_id: Uuid) -> String {
        format!("{}/api/bookings/{booking_id}", self.base_url)
    }
}

#[async_trait]
impl BookingClient for HttpBookingClient {
    async fn get_booking(&self, booking_id: Uuid) -> Result<BookingSnapshot, DomainError> {
        let response = self
            .client
            .get(self.booking_url(booking_id))
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        decode(SERVICE, response).await
    }

    async fn confirm_booking(
        &self,
        booking_id: Uuid,
        payment_id: Uuid,
    ) -> Result<BookingSnapshot, DomainError> {
        tracing::debug!(%booking_id, %payment_id, "confirming booking");
        let response = self
            .client
            .post(format!("{}/confirm", self.booking_url(booking_id)))
            .json(&ConfirmBookingRequest { payment_id })
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        decode(SERVICE, response).await
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> Result<(), DomainError> {
        tracing::debug!(%booking_id, "cancelling booking");
        let response = self
            .client
            .delete(self.booking_url(booking_id))
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(classify_error(SERVICE, response).await)
    }
}

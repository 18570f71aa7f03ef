//! HTTP client for the event catalog service.

use async_trait::async_trait;
use serde::Serialize;
use ticketline_booking::client::{CatalogClient, EventSnapshot};
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::{build_client, decode, transport_error};

const SERVICE: &str = "event catalog service";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSeatsRequest {
    seats_to_book: u32,
    reservation_ref: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseSeatsRequest {
    seats_to_release: u32,
    reservation_ref: Uuid,
}

/// Talks to the event catalog service over its REST API.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Creates a client for a catalog service rooted at `base_url`
    /// (for example `http://localhost:8082`).
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

    fn event_url(&self, event_id: Uuid) -> String {
        format!("{}/api/events/{event_id}", self.base_url)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_event(&self, event_id: Uuid) -> Result<EventSnapshot, DomainError> {
        let response = self
            .client
            .get(self.event_url(event_id))
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        decode(SERVICE, response).await
    }

    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        tracing::debug!(%event_id, seats, %reservation_ref, "reserving seats");
        let response = self
            .client
            .patch(format!("{}/seats", self.event_url(event_id)))
            .json(&UpdateSeatsRequest {
                seats_to_book: seats,
                reservation_ref,
            })
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        decode(SERVICE, response).await
    }

    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        tracing::debug!(%event_id, seats, %reservation_ref, "releasing seats");
        let response = self
            .client
            .post(format!("{}/seats/release", self.event_url(event_id)))
            .json(&ReleaseSeatsRequest {
                seats_to_release: seats,
                reservation_ref,
            })
            .send()
            .await
            .map_err(|err| transport_error(SERVICE, &err))?;
        decode(SERVICE, response).await
    }
}

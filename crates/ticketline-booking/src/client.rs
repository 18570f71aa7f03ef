//! Outbound port to the event catalog.
//!
//! The coordinator never holds a live reference to the catalog service;
//! everything goes through this one-directional interface, injected at
//! startup. The HTTP implementation lives in `ticketline-client`.

use async_trait::async_trait;
use serde::Deserialize;
use ticketline_core::error::DomainError;
use uuid::Uuid;

/// The slice of a remote event this service needs: status and price for
/// validation, the seat count for a fast availability check. Status stays a
/// plain wire string; the catalog owns the enum.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    /// Event identifier.
    pub id: Uuid,
    /// Seats available at snapshot time.
    pub available_seats: u32,
    /// Ticket price in minor currency units.
    pub price: i64,
    /// Lifecycle status as it appears on the wire.
    pub status: String,
}

impl EventSnapshot {
    /// True if the event accepts bookings.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == "PUBLISHED"
    }
}

/// Client port to the catalog service. Calls are synchronous with a bounded
/// timeout; a timed-out call surfaces as `DomainError::ServiceUnavailable`.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches the current event snapshot.
    async fn get_event(&self, event_id: Uuid) -> Result<EventSnapshot, DomainError>;

    /// Reserves seats, idempotent per `reservation_ref`.
    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError>;

    /// Releases seats, idempotent per `reservation_ref`.
    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError>;
}

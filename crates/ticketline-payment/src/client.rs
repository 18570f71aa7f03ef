//! Outbound port to the booking coordinator.
//!
//! One-directional: the payment processor calls bookings, never the other
//! way around. The HTTP implementation lives in `ticketline-client`.

use async_trait::async_trait;
use serde::Deserialize;
use ticketline_core::error::DomainError;
use uuid::Uuid;

/// The slice of a remote booking the payment processor validates against.
/// Status stays a plain wire string; the booking service owns the enum.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSnapshot {
    /// Booking identifier.
    pub id: Uuid,
    /// The booking user.
    pub user_id: Uuid,
    /// The booked event.
    pub event_id: Uuid,
    /// Number of seats booked.
    pub number_of_tickets: u32,
    /// Price captured when the booking was created.
    pub total_amount: i64,
    /// Lifecycle status as it appears on the wire.
    pub status: String,
    /// The payment already attached to the booking, if any.
    pub payment_id: Option<Uuid>,
}

impl BookingSnapshot {
    /// True if the booking still awaits payment.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == "PENDING"
    }

    /// True if the booking has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == "CANCELLED"
    }
}

/// Client port to the booking service. Calls are synchronous with a bounded
/// timeout; a timed-out call surfaces as `DomainError::ServiceUnavailable`.
#[async_trait]
pub trait BookingClient: Send + Sync {
    /// Fetches the current booking snapshot.
    async fn get_booking(&self, booking_id: Uuid) -> Result<BookingSnapshot, DomainError>;

    /// Confirms a pending booking with the given payment.
    async fn confirm_booking(
        &self,
        booking_id: Uuid,
        payment_id: Uuid,
    ) -> Result<BookingSnapshot, DomainError>;

    /// Cancels a booking, releasing its seats.
    async fn cancel_booking(&self, booking_id: Uuid) -> Result<(), DomainError>;
}

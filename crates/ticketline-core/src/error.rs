//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type shared by all three services.
///
/// Every variant has a fixed HTTP status at the service edge (see the api
/// crate). Outbound clients map response statuses back by status class:
/// `NotFound` (404), `InvalidState` (409) and `ServiceUnavailable` (5xx,
/// timeouts) come back as themselves, while the remaining 4xx kinds come
/// back as `Validation` carrying the remote message.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Malformed or out-of-range input, rejected before any remote call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Not enough seats left to satisfy a reservation.
    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats {
        /// Seats requested by the caller.
        requested: u32,
        /// Seats available at the time of the check.
        available: u32,
    },

    /// The event is not open for booking.
    #[error("event {event_id} is not open for booking (status: {status})")]
    EventNotPublished {
        /// The event in question.
        event_id: Uuid,
        /// Its current status.
        status: String,
    },

    /// A payment precondition on the booking does not hold (wrong state,
    /// duplicate payment, amount or user mismatch).
    #[error("invalid booking state: {0}")]
    InvalidBookingState(String),

    /// An attempted transition violates a state machine.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A dependency timed out or answered with a server error.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An internal fault. The message is for logs only and is never echoed
    /// to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// True if the error signals a transient dependency failure worth
    /// retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

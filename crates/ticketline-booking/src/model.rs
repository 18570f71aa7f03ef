//! Booking model and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_core::error::DomainError;
use uuid::Uuid;

/// Lifecycle status of a booking.
///
/// Transitions are monotonic: `Pending` → `Confirmed`, `Pending` →
/// `Cancelled`, and `Confirmed` → `Cancelled` (refund only). `Cancelled` and
/// `Completed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Paid for.
    Confirmed,
    /// Cancelled or refunded; seats have been released.
    Cancelled,
    /// The event has taken place.
    Completed,
}

impl BookingStatus {
    /// Stable string form, used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses the storage/wire form back into a status.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input on failure.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(other.to_owned()),
        }
    }
}

/// A booking of seats for one event by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking identifier.
    pub id: Uuid,
    /// The booking user.
    pub user_id: Uuid,
    /// Weak reference to the event at the catalog.
    pub event_id: Uuid,
    /// Number of seats reserved, at least 1.
    pub number_of_tickets: u32,
    /// Price captured at creation time; immutable even if the event's price
    /// changes later.
    pub total_amount: i64,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// The payment that confirmed this booking, if any.
    pub payment_id: Option<Uuid>,
    /// Idempotency token for this booking's seat reservation. Reused for
    /// the compensating release so a retried release never double-credits.
    pub reservation_ref: Uuid,
    /// When the booking was created.
    pub booking_date: DateTime<Utc>,
    /// When the booking was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Marks the booking confirmed by `payment_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the booking is `Pending`;
    /// a second confirm is rejected, never silently re-applied.
    pub fn confirm(&mut self, payment_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != BookingStatus::Pending {
            return Err(DomainError::InvalidState(format!(
                "booking {} cannot be confirmed from status {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.status = BookingStatus::Confirmed;
        self.payment_id = Some(payment_id);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the booking cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the booking is `Pending`
    /// or `Confirmed` (the latter only happens through a refund).
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {
                self.status = BookingStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
            BookingStatus::Cancelled | BookingStatus::Completed => {
                Err(DomainError::InvalidState(format!(
                    "booking {} cannot be cancelled from status {}",
                    self.id,
                    self.status.as_str()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            number_of_tickets: 2,
            total_amount: 9000,
            status: BookingStatus::Pending,
            payment_id: None,
            reservation_ref: Uuid::new_v4(),
            booking_date: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirm_sets_status_and_payment_id() {
        let mut booking = pending_booking();
        let payment_id = Uuid::new_v4();

        booking.confirm(payment_id, Utc::now()).unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_id, Some(payment_id));
    }

    #[test]
    fn test_second_confirm_is_rejected_and_changes_nothing() {
        let mut booking = pending_booking();
        let payment_id = Uuid::new_v4();
        booking.confirm(payment_id, Utc::now()).unwrap();

        let err = booking.confirm(Uuid::new_v4(), Utc::now()).unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(booking.payment_id, Some(payment_id));
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_cancel_from_pending_and_confirmed() {
        let mut pending = pending_booking();
        pending.cancel(Utc::now()).unwrap();
        assert_eq!(pending.status, BookingStatus::Cancelled);

        let mut confirmed = pending_booking();
        confirmed.confirm(Uuid::new_v4(), Utc::now()).unwrap();
        confirmed.cancel(Utc::now()).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_is_not_reapplied_to_cancelled_booking() {
        let mut booking = pending_booking();
        booking.cancel(Utc::now()).unwrap();

        let err = booking.cancel(Utc::now()).unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
    }
}

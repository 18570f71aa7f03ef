//! Payment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a payment. `Refunded` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// The payment has been taken.
    Completed,
    /// The payment has been refunded.
    Refunded,
}

impl PaymentStatus {
    /// Stable string form, used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parses the storage/wire form back into a status.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input on failure.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "COMPLETED" => Ok(Self::Completed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(other.to_owned()),
        }
    }
}

/// A payment taken for one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment identifier.
    pub id: Uuid,
    /// Weak reference to the booking this payment covers. At most one
    /// `Completed` payment may reference a booking at any time.
    pub booking_id: Uuid,
    /// The paying user.
    pub user_id: Uuid,
    /// Amount in minor currency units; must equal the booking's total.
    pub amount: i64,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// How the payment was made.
    pub payment_method: String,
    /// Globally unique transaction token.
    pub transaction_id: String,
    /// When the payment was taken.
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// Generates a collision-free transaction token. Uuid-based rather than
    /// timestamp-based: two payments in the same instant must not collide.
    #[must_use]
    pub fn new_transaction_id() -> String {
        format!("TXN-{}", Uuid::new_v4().simple())
    }
}

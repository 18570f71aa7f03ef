//! Event model for the catalog service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not yet open for booking.
    Draft,
    /// Open for booking.
    Published,
    /// Cancelled by the organizer.
    Cancelled,
    /// The event has taken place.
    Completed,
}

impl EventStatus {
    /// Stable string form, used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
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
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(other.to_owned()),
        }
    }
}

/// An event with a fixed seating capacity.
///
/// `available_seats` is the only field with cross-service consistency
/// obligations; it changes exclusively through the store's reserve/release
/// operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Total seating capacity.
    pub capacity: u32,
    /// Seats still available, always within `0..=capacity`.
    pub available_seats: u32,
    /// Ticket price in minor currency units.
    pub price: i64,
    /// Lifecycle status.
    pub status: EventStatus,
    /// When the event record was created.
    pub created_at: DateTime<Utc>,
    /// When the event record was last changed.
    pub updated_at: DateTime<Utc>,
}

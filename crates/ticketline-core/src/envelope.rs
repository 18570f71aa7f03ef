//! Wire error envelope.
//!
//! Exceptions do not cross process boundaries; the HTTP status plus this
//! envelope is the whole cross-service error contract. The api crate emits
//! it and the client crate parses it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON body returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The HTTP status code, repeated in the body.
    pub status: u16,
    /// Human-readable error message.
    pub message: String,
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Builds an envelope for the given status and message.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trips_field_names() {
        let envelope = ErrorEnvelope::new(404, "Booking not found", Utc::now());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["message"], "Booking not found");
        assert!(json["timestamp"].is_string());
    }
}

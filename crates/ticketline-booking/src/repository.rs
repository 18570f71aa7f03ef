//! Booking repository abstraction and in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::model::Booking;

/// Storage port for the booking coordinator.
///
/// `confirm` and `cancel` are conditional transitions: the state check and
/// the write happen atomically inside the store, so two concurrent confirm
/// calls can never both succeed.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persists a new booking.
    async fn insert(&self, booking: Booking) -> Result<(), DomainError>;

    /// Loads a booking by id.
    async fn get(&self, id: Uuid) -> Result<Option<Booking>, DomainError>;

    /// Loads all bookings.
    async fn list(&self) -> Result<Vec<Booking>, DomainError>;

    /// Loads all bookings made by one user.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError>;

    /// Transitions `Pending` → `Confirmed`, recording the payment.
    async fn confirm(
        &self,
        id: Uuid,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking, DomainError>;

    /// Transitions `Pending`/`Confirmed` → `Cancelled`.
    async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> Result<Booking, DomainError>;
}

/// In-memory booking repository for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Booking>> {
        self.bookings.lock().expect("booking repository lock poisoned")
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), DomainError> {
        self.lock().insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, DomainError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, DomainError> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError> {
        Ok(self
            .lock()
            .values()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn confirm(
        &self,
        id: Uuid,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        let mut bookings = self.lock();
        let Some(booking) = bookings.get_mut(&id) else {
            return Err(DomainError::NotFound(format!(
                "Booking not found with id: {id}"
            )));
        };
        booking.confirm(payment_id, now)?;
        Ok(booking.clone())
    }

    async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> Result<Booking, DomainError> {
        let mut bookings = self.lock();
        let Some(booking) = bookings.get_mut(&id) else {
            return Err(DomainError::NotFound(format!(
                "Booking not found with id: {id}"
            )));
        };
        booking.cancel(now)?;
        Ok(booking.clone())
    }
}

//! Event store abstraction and in-memory implementation.
//!
//! Concurrent reservations against the same event are the one place in the
//! system where a read-modify-write race is possible. Both implementations
//! eliminate it by construction: the in-memory store checks and decrements
//! inside a single critical section, the Postgres store (in
//! `ticketline-store`) uses one conditional `UPDATE`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::model::{Event, EventStatus};

/// Storage port for the catalog service.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists a new event.
    async fn insert(&self, event: Event) -> Result<(), DomainError>;

    /// Loads an event by id.
    async fn get(&self, id: Uuid) -> Result<Option<Event>, DomainError>;

    /// Loads all events.
    async fn list(&self) -> Result<Vec<Event>, DomainError>;

    /// Replaces an event's mutable attributes. `available_seats` is taken
    /// from the stored row, never from `event`.
    async fn update(&self, event: Event) -> Result<(), DomainError>;

    /// Atomically decrements `available_seats` by `seats` if the event is
    /// published and has enough seats left. Idempotent per
    /// `reservation_ref`: a repeat of an applied reservation returns the
    /// current count without decrementing again. Returns the remaining seat
    /// count. No mutation occurs on failure.
    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError>;

    /// Compensating operation: increments `available_seats` by `seats`,
    /// capped at capacity. Idempotent per `reservation_ref`: releasing the
    /// same reservation twice never double-credits. Returns the remaining
    /// seat count.
    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError>;
}

/// Ledger entry tracking one seat reservation for idempotency.
#[derive(Debug, Clone)]
struct Reservation {
    seats: u32,
    released: bool,
}

#[derive(Debug, Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    reservations: HashMap<Uuid, Reservation>,
}

/// In-memory event store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: Mutex<Inner>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-mutation; propagating the panic
        // is the only sound option for an in-memory store.
        self.inner.lock().expect("event store lock poisoned")
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: Event) -> Result<(), DomainError> {
        self.lock().events.insert(event.id, event);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, DomainError> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, DomainError> {
        Ok(self.lock().events.values().cloned().collect())
    }

    async fn update(&self, event: Event) -> Result<(), DomainError> {
        let mut inner = self.lock();
        let Some(stored) = inner.events.get_mut(&event.id) else {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {}",
                event.id
            )));
        };
        let seats = stored.available_seats;
        *stored = Event {
            available_seats: seats,
            ..event
        };
        Ok(())
    }

    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError> {
        let mut inner = self.lock();

        if inner.reservations.contains_key(&reservation_ref) {
            // Recognized repeat of an applied (or already compensated)
            // reservation: report the current count, apply nothing.
            let event = inner.events.get(&event_id).ok_or_else(|| {
                DomainError::NotFound(format!("Event not found with id: {event_id}"))
            })?;
            return Ok(event.available_seats);
        }

        let Some(event) = inner.events.get_mut(&event_id) else {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        };
        if event.status != EventStatus::Published {
            return Err(DomainError::EventNotPublished {
                event_id,
                status: event.status.as_str().to_owned(),
            });
        }
        if event.available_seats < seats {
            return Err(DomainError::InsufficientSeats {
                requested: seats,
                available: event.available_seats,
            });
        }

        event.available_seats -= seats;
        let remaining = event.available_seats;
        inner.reservations.insert(
            reservation_ref,
            Reservation {
                seats,
                released: false,
            },
        );
        Ok(remaining)
    }

    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError> {
        let mut inner = self.lock();

        let credit = match inner.reservations.get_mut(&reservation_ref) {
            Some(reservation) if reservation.released => 0,
            Some(reservation) => {
                reservation.released = true;
                reservation.seats
            }
            None => {
                // Release observed before (or without) its reservation: mark
                // the ref consumed so a late-arriving reserve becomes a
                // no-op repeat instead of a second decrement.
                inner.reservations.insert(
                    reservation_ref,
                    Reservation {
                        seats,
                        released: true,
                    },
                );
                seats
            }
        };

        let Some(event) = inner.events.get_mut(&event_id) else {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        };
        event.available_seats = event
            .available_seats
            .saturating_add(credit)
            .min(event.capacity);
        Ok(event.available_seats)
    }
}

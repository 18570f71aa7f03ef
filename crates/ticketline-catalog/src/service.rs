//! Catalog application service.

use std::sync::Arc;

use ticketline_core::clock::Clock;
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::model::{Event, EventStatus};
use crate::store::EventStore;

/// Attributes for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Total seating capacity; also the initial available seat count.
    pub capacity: u32,
    /// Ticket price in minor currency units.
    pub price: i64,
    /// Initial status; defaults to `Published`.
    pub status: Option<EventStatus>,
}

/// Attributes replaced by an event update. Seat counts are not among them.
#[derive(Debug, Clone)]
pub struct EventUpdate {
    /// New display name.
    pub name: String,
    /// New capacity.
    pub capacity: u32,
    /// New ticket price. Existing bookings keep the amount captured at
    /// creation time.
    pub price: i64,
    /// New status, if changing.
    pub status: Option<EventStatus>,
}

/// The inventory authority: owns events and seat counts.
pub struct CatalogService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    /// Creates the service over a store and a clock.
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates a new event with all seats available.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty name, a zero capacity
    /// or a negative price.
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event, DomainError> {
        if new_event.name.trim().is_empty() {
            return Err(DomainError::Validation("event name must not be empty".into()));
        }
        if new_event.capacity == 0 {
            return Err(DomainError::Validation(
                "event capacity must be at least 1".into(),
            ));
        }
        if new_event.price < 0 {
            return Err(DomainError::Validation("event price must not be negative".into()));
        }

        let now = self.clock.now();
        let event = Event {
            id: Uuid::new_v4(),
            name: new_event.name,
            capacity: new_event.capacity,
            available_seats: new_event.capacity,
            price: new_event.price,
            status: new_event.status.unwrap_or(EventStatus::Published),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(event.clone()).await?;
        tracing::info!(event_id = %event.id, capacity = event.capacity, "event created");
        Ok(event)
    }

    /// Replaces an event's attributes. The available seat count is owned by
    /// the reserve/release operations and is never written here.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist.
    pub async fn update_event(&self, id: Uuid, update: EventUpdate) -> Result<Event, DomainError> {
        let Some(existing) = self.store.get(id).await? else {
            return Err(DomainError::NotFound(format!("Event not found with id: {id}")));
        };

        let event = Event {
            id,
            name: update.name,
            capacity: update.capacity,
            available_seats: existing.available_seats,
            price: update.price,
            status: update.status.unwrap_or(existing.status),
            created_at: existing.created_at,
            updated_at: self.clock.now(),
        };
        self.store.update(event).await?;
        // Re-read so the caller sees the stored row, seats included.
        self.get_event(id).await
    }

    /// Loads an event by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist.
    pub async fn get_event(&self, id: Uuid) -> Result<Event, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Event not found with id: {id}")))
    }

    /// Loads all events.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store fails.
    pub async fn list_events(&self) -> Result<Vec<Event>, DomainError> {
        self.store.list().await
    }

    /// Reserves seats: an atomic conditional decrement, idempotent per
    /// `reservation_ref`. Callers without a ref of their own get a fresh
    /// one-shot token.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero count, `NotFound`,
    /// `EventNotPublished` or `InsufficientSeats` from the store.
    pub async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Option<Uuid>,
    ) -> Result<Event, DomainError> {
        if seats == 0 {
            return Err(DomainError::Validation(
                "seatsToBook must be at least 1".into(),
            ));
        }
        let reservation_ref = reservation_ref.unwrap_or_else(Uuid::new_v4);
        let remaining = self
            .store
            .reserve_seats(event_id, seats, reservation_ref)
            .await?;
        tracing::info!(
            %event_id,
            seats,
            %reservation_ref,
            remaining,
            "seats reserved"
        );
        self.get_event(event_id).await
    }

    /// Releases previously reserved seats, capped at capacity and idempotent
    /// per `reservation_ref`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero count or `NotFound` from the store.
    pub async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Option<Uuid>,
    ) -> Result<Event, DomainError> {
        if seats == 0 {
            return Err(DomainError::Validation(
                "seatsToRelease must be at least 1".into(),
            ));
        }
        let reservation_ref = reservation_ref.unwrap_or_else(Uuid::new_v4);
        let remaining = self
            .store
            .release_seats(event_id, seats, reservation_ref)
            .await?;
        tracing::info!(
            %event_id,
            seats,
            %reservation_ref,
            remaining,
            "seats released"
        );
        self.get_event(event_id).await
    }
}

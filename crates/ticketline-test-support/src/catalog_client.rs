//! Test doubles for the booking coordinator's catalog port.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ticketline_booking::client::{CatalogClient, EventSnapshot};
use ticketline_core::error::DomainError;
use uuid::Uuid;

struct StubEvent {
    available_seats: u32,
    price: i64,
    status: String,
}

/// A catalog client backed by a single in-memory event. Records every
/// reserve and release call and can be told to fail upcoming releases with
/// a transient error.
pub struct StubCatalogClient {
    event_id: Uuid,
    event: Mutex<StubEvent>,
    reserves: Mutex<Vec<(Uuid, u32, Uuid)>>,
    releases: Mutex<Vec<(Uuid, u32, Uuid)>>,
    release_failures: AtomicU32,
}

impl StubCatalogClient {
    /// Creates a stub holding one event with the given seats, price and
    /// wire status.
    #[must_use]
    pub fn with_event(available_seats: u32, price: i64, status: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event: Mutex::new(StubEvent {
                available_seats,
                price,
                status: status.to_owned(),
            }),
            reserves: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            release_failures: AtomicU32::new(0),
        }
    }

    /// The id of the stub's event.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Changes the event's price, as a later catalog update would.
    pub fn set_price(&self, price: i64) {
        self.event.lock().unwrap().price = price;
    }

    /// Makes the next `count` release calls fail with `ServiceUnavailable`.
    pub fn fail_next_releases(&self, count: u32) {
        self.release_failures.store(count, Ordering::SeqCst);
    }

    /// All applied reserve calls as `(event_id, seats, reservation_ref)`.
    #[must_use]
    pub fn reserved_calls(&self) -> Vec<(Uuid, u32, Uuid)> {
        self.reserves.lock().unwrap().clone()
    }

    /// All applied release calls as `(event_id, seats, reservation_ref)`.
    #[must_use]
    pub fn released_calls(&self) -> Vec<(Uuid, u32, Uuid)> {
        self.releases.lock().unwrap().clone()
    }

    fn snapshot(&self) -> EventSnapshot {
        let event = self.event.lock().unwrap();
        EventSnapshot {
            id: self.event_id,
            available_seats: event.available_seats,
            price: event.price,
            status: event.status.clone(),
        }
    }

    fn take_failure(&self, counter: &AtomicU32) -> bool {
        if counter.load(Ordering::SeqCst) > 0 {
            counter.fetch_sub(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl CatalogClient for StubCatalogClient {
    async fn get_event(&self, event_id: Uuid) -> Result<EventSnapshot, DomainError> {
        if event_id != self.event_id {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        }
        Ok(self.snapshot())
    }

    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        if event_id != self.event_id {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        }
        {
            let mut event = self.event.lock().unwrap();
            if event.available_seats < seats {
                return Err(DomainError::InsufficientSeats {
                    requested: seats,
                    available: event.available_seats,
                });
            }
            event.available_seats -= seats;
        }
        self.reserves
            .lock()
            .unwrap()
            .push((event_id, seats, reservation_ref));
        Ok(self.snapshot())
    }

    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        if self.take_failure(&self.release_failures) {
            return Err(DomainError::ServiceUnavailable(
                "catalog service timed out".into(),
            ));
        }
        if event_id != self.event_id {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        }
        self.event.lock().unwrap().available_seats += seats;
        self.releases
            .lock()
            .unwrap()
            .push((event_id, seats, reservation_ref));
        Ok(self.snapshot())
    }
}

/// A catalog client whose every call fails with `ServiceUnavailable`, for
/// dependency-outage scenarios.
#[derive(Debug, Default)]
pub struct UnavailableCatalogClient;

#[async_trait]
impl CatalogClient for UnavailableCatalogClient {
    async fn get_event(&self, _event_id: Uuid) -> Result<EventSnapshot, DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Event Service is currently unavailable".into(),
        ))
    }

    async fn reserve_seats(
        &self,
        _event_id: Uuid,
        _seats: u32,
        _reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Event Service is currently unavailable".into(),
        ))
    }

    async fn release_seats(
        &self,
        _event_id: Uuid,
        _seats: u32,
        _reservation_ref: Uuid,
    ) -> Result<EventSnapshot, DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Event Service is currently unavailable".into(),
        ))
    }
}

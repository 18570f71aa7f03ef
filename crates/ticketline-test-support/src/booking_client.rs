//! Test doubles for the payment processor's booking port.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ticketline_core::error::DomainError;
use ticketline_payment::client::{BookingClient, BookingSnapshot};
use uuid::Uuid;

/// A booking client backed by a single in-memory booking snapshot. Records
/// confirm and cancel calls and can simulate transient failures, including
/// the ambiguous case where a confirm applies but its response is lost.
pub struct StubBookingClient {
    booking: Mutex<BookingSnapshot>,
    gets: AtomicU32,
    confirm_failures: AtomicU32,
    lost_confirm_responses: AtomicU32,
    cancel_failures: AtomicU32,
    confirms: Mutex<Vec<(Uuid, Uuid)>>,
    cancels: Mutex<Vec<Uuid>>,
}

impl StubBookingClient {
    /// Creates a stub holding one pending booking with the given total.
    #[must_use]
    pub fn pending(total_amount: i64) -> Self {
        Self {
            booking: Mutex::new(BookingSnapshot {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                event_id: Uuid::new_v4(),
                number_of_tickets: 2,
                total_amount,
                status: "PENDING".to_owned(),
                payment_id: None,
            }),
            gets: AtomicU32::new(0),
            confirm_failures: AtomicU32::new(0),
            lost_confirm_responses: AtomicU32::new(0),
            cancel_failures: AtomicU32::new(0),
            confirms: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
        }
    }

    /// The id of the stub's booking.
    #[must_use]
    pub fn booking_id(&self) -> Uuid {
        self.booking.lock().unwrap().id
    }

    /// The booking's user.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.booking.lock().unwrap().user_id
    }

    /// The booking's captured total.
    #[must_use]
    pub fn total_amount(&self) -> i64 {
        self.booking.lock().unwrap().total_amount
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> BookingSnapshot {
        self.booking.lock().unwrap().clone()
    }

    /// Overrides the booking's wire status.
    pub fn set_status(&self, status: &str) {
        self.booking.lock().unwrap().status = status.to_owned();
    }

    /// Overrides the booking's attached payment.
    pub fn set_payment_id(&self, payment_id: Option<Uuid>) {
        self.booking.lock().unwrap().payment_id = payment_id;
    }

    /// Makes the next `count` confirm calls fail with `ServiceUnavailable`
    /// without applying.
    pub fn fail_next_confirms(&self, count: u32) {
        self.confirm_failures.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` confirm calls apply but answer with
    /// `ServiceUnavailable`, as a dropped response would.
    pub fn lose_next_confirm_responses(&self, count: u32) {
        self.lost_confirm_responses.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` cancel calls fail with `ServiceUnavailable`.
    pub fn fail_next_cancels(&self, count: u32) {
        self.cancel_failures.store(count, Ordering::SeqCst);
    }

    /// All applied confirm calls as `(booking_id, payment_id)`.
    #[must_use]
    pub fn confirmed_calls(&self) -> Vec<(Uuid, Uuid)> {
        self.confirms.lock().unwrap().clone()
    }

    /// All applied cancel calls.
    #[must_use]
    pub fn cancelled_calls(&self) -> Vec<Uuid> {
        self.cancels.lock().unwrap().clone()
    }

    /// Number of `get_booking` calls observed.
    #[must_use]
    pub fn get_calls(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
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
impl BookingClient for StubBookingClient {
    async fn get_booking(&self, booking_id: Uuid) -> Result<BookingSnapshot, DomainError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let booking = self.booking.lock().unwrap();
        if booking_id != booking.id {
            return Err(DomainError::NotFound(format!(
                "Booking not found with id: {booking_id}"
            )));
        }
        Ok(booking.clone())
    }

    async fn confirm_booking(
        &self,
        booking_id: Uuid,
        payment_id: Uuid,
    ) -> Result<BookingSnapshot, DomainError> {
        if self.take_failure(&self.confirm_failures) {
            return Err(DomainError::ServiceUnavailable(
                "booking service timed out".into(),
            ));
        }

        let snapshot = {
            let mut booking = self.booking.lock().unwrap();
            if booking_id != booking.id {
                return Err(DomainError::NotFound(format!(
                    "Booking not found with id: {booking_id}"
                )));
            }
            if booking.status != "PENDING" {
                return Err(DomainError::InvalidState(format!(
                    "booking {booking_id} cannot be confirmed from status {}",
                    booking.status
                )));
            }
            booking.status = "CONFIRMED".to_owned();
            booking.payment_id = Some(payment_id);
            booking.clone()
        };
        self.confirms.lock().unwrap().push((booking_id, payment_id));

        if self.take_failure(&self.lost_confirm_responses) {
            return Err(DomainError::ServiceUnavailable(
                "booking service timed out".into(),
            ));
        }
        Ok(snapshot)
    }

    async fn cancel_booking(&self, booking_id: Uuid) -> Result<(), DomainError> {
        if self.take_failure(&self.cancel_failures) {
            return Err(DomainError::ServiceUnavailable(
                "booking service timed out".into(),
            ));
        }

        let mut booking = self.booking.lock().unwrap();
        if booking_id != booking.id {
            return Err(DomainError::NotFound(format!(
                "Booking not found with id: {booking_id}"
            )));
        }
        match booking.status.as_str() {
            "PENDING" | "CONFIRMED" => {
                booking.status = "CANCELLED".to_owned();
                drop(booking);
                self.cancels.lock().unwrap().push(booking_id);
                Ok(())
            }
            other => Err(DomainError::InvalidState(format!(
                "booking {booking_id} cannot be cancelled from status {other}"
            ))),
        }
    }
}

/// A booking client whose every call fails with `ServiceUnavailable`, for
/// dependency-outage scenarios.
#[derive(Debug, Default)]
pub struct UnavailableBookingClient;

#[async_trait]
impl BookingClient for UnavailableBookingClient {
    async fn get_booking(&self, _booking_id: Uuid) -> Result<BookingSnapshot, DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Booking Service is currently unavailable".into(),
        ))
    }

    async fn confirm_booking(
        &self,
        _booking_id: Uuid,
        _payment_id: Uuid,
    ) -> Result<BookingSnapshot, DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Booking Service is currently unavailable".into(),
        ))
    }

    async fn cancel_booking(&self, _booking_id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::ServiceUnavailable(
            "Booking Service is currently unavailable".into(),
        ))
    }
}

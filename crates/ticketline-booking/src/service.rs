//! Booking application service — the coordination core.
//!
//! Ordering rule: the seat reservation is the source of truth. A booking row
//! is only written after its reservation succeeded, and if that write fails
//! the reservation is compensated before the error is returned. The reverse
//! (booking first, reservation best-effort) would allow phantom bookings,
//! which compensation cannot recover.

use std::sync::Arc;

use ticketline_core::clock::Clock;
use ticketline_core::error::DomainError;
use ticketline_core::retry::RetryPolicy;
use uuid::Uuid;

use crate::client::CatalogClient;
use crate::model::{Booking, BookingStatus};
use crate::repository::BookingRepository;

/// The booking coordinator.
pub struct BookingService {
    repository: Arc<dyn BookingRepository>,
    catalog: Arc<dyn CatalogClient>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl BookingService {
    /// Creates the service over its storage, its outbound catalog port, a
    /// clock and the retry policy used for compensating releases.
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        catalog: Arc<dyn CatalogClient>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            catalog,
            clock,
            retry,
        }
    }

    /// Creates a booking: validates the event, reserves seats at the
    /// catalog, then persists the booking as `Pending`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `number_of_tickets` is zero.
    /// - `NotFound` if the event does not exist.
    /// - `EventNotPublished` if the event is not open for booking.
    /// - `InsufficientSeats` if not enough seats are left; no booking row is
    ///   created.
    /// - `ServiceUnavailable` if the catalog times out or fails; no booking
    ///   row is created, and a reserve whose outcome is unknown is followed
    ///   by a best-effort release under the same reservation ref.
    ///
    /// If persisting the booking fails after the reservation succeeded, the
    /// reservation is released before the storage error is returned.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        number_of_tickets: u32,
    ) -> Result<Booking, DomainError> {
        if number_of_tickets == 0 {
            return Err(DomainError::Validation(
                "numberOfTickets must be at least 1".into(),
            ));
        }

        tracing::info!(%event_id, "fetching event details");
        let event = self.catalog.get_event(event_id).await?;

        if !event.is_published() {
            return Err(DomainError::EventNotPublished {
                event_id,
                status: event.status.clone(),
            });
        }
        if event.available_seats < number_of_tickets {
            // Fast fail on the snapshot; the reservation below remains the
            // authoritative check under concurrency.
            return Err(DomainError::InsufficientSeats {
                requested: number_of_tickets,
                available: event.available_seats,
            });
        }

        let reservation_ref = Uuid::new_v4();
        if let Err(err) = self
            .catalog
            .reserve_seats(event_id, number_of_tickets, reservation_ref)
            .await
        {
            if err.is_transient() {
                // A timeout or 5xx leaves the reserve in doubt: it may have
                // landed before the failure was observed. Releasing under the
                // same ref settles it either way; the catalog's reservation
                // ledger turns a release for a reserve that never happened
                // into a no-op.
                tracing::warn!(
                    %event_id,
                    %reservation_ref,
                    error = %err,
                    "reserve outcome unknown, issuing compensating release"
                );
                if let Err(release_err) = self
                    .release_with_retry(event_id, number_of_tickets, reservation_ref)
                    .await
                {
                    tracing::error!(
                        %event_id,
                        %reservation_ref,
                        error = %release_err,
                        "compensating seat release failed"
                    );
                }
            }
            return Err(err);
        }

        let total_amount = event
            .price
            .checked_mul(i64::from(number_of_tickets))
            .ok_or_else(|| DomainError::Validation("total amount overflows".into()))?;

        let now = self.clock.now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            number_of_tickets,
            total_amount,
            status: BookingStatus::Pending,
            payment_id: None,
            reservation_ref,
            booking_date: now,
            updated_at: now,
        };

        if let Err(err) = self.repository.insert(booking.clone()).await {
            // Seats are already held; without this release they would leak.
            tracing::warn!(
                %event_id,
                %reservation_ref,
                error = %err,
                "booking write failed after reservation, compensating"
            );
            if let Err(release_err) = self
                .release_with_retry(event_id, number_of_tickets, reservation_ref)
                .await
            {
                tracing::error!(
                    %event_id,
                    %reservation_ref,
                    error = %release_err,
                    "compensating seat release failed"
                );
            }
            return Err(err);
        }

        tracing::info!(booking_id = %booking.id, %event_id, number_of_tickets, "booking created");
        Ok(booking)
    }

    /// Confirms a `Pending` booking, attaching the payment that paid for it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` if it is not
    /// `Pending`; a second confirm is rejected, not re-applied.
    pub async fn confirm_booking(
        &self,
        id: Uuid,
        payment_id: Uuid,
    ) -> Result<Booking, DomainError> {
        let booking = self.repository.confirm(id, payment_id, self.clock.now()).await?;
        tracing::info!(booking_id = %id, %payment_id, "booking confirmed");
        Ok(booking)
    }

    /// Cancels a `Pending` or `Confirmed` booking and restores its seats.
    ///
    /// The release runs first, keyed by the booking's reservation ref, so a
    /// crash between the two steps leaves a retryable state instead of
    /// stranded seats; the ref makes the retried release a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` for a
    /// booking that is already `Cancelled` or `Completed` (checked before
    /// anything is released, so a double cancel never double-credits),
    /// `ServiceUnavailable` if the catalog cannot be reached; the booking
    /// is left unchanged and the cancel can be retried.
    pub async fn cancel_booking(&self, id: Uuid) -> Result<(), DomainError> {
        let booking = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Booking not found with id: {id}")))?;

        match booking.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {}
            BookingStatus::Cancelled | BookingStatus::Completed => {
                return Err(DomainError::InvalidState(format!(
                    "booking {id} cannot be cancelled from status {}",
                    booking.status.as_str()
                )));
            }
        }

        self.release_with_retry(
            booking.event_id,
            booking.number_of_tickets,
            booking.reservation_ref,
        )
        .await?;

        self.repository.cancel(id, self.clock.now()).await?;
        tracing::info!(booking_id = %id, event_id = %booking.event_id, "booking cancelled");
        Ok(())
    }

    /// Loads a booking by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Booking not found with id: {id}")))
    }

    /// Loads all bookings.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, DomainError> {
        self.repository.list().await
    }

    /// Loads all bookings made by one user.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError> {
        self.repository.list_by_user(user_id).await
    }

    /// Releases seats at the catalog, retrying transient failures with
    /// backoff. Safe to repeat thanks to the reservation ref.
    async fn release_with_retry(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<(), DomainError> {
        let mut attempt = 0;
        loop {
            match self
                .catalog
                .release_seats(event_id, seats, reservation_ref)
                .await
            {
                Ok(_) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        %event_id,
                        %reservation_ref,
                        attempt,
                        error = %err,
                        "seat release failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

//! Payment application service.
//!
//! The payment commit and the booking confirmation live in different
//! processes and cannot share a transaction. The discipline here: validate
//! everything against a fresh booking snapshot, commit the payment locally,
//! then confirm the booking under a bounded retry. A retry that answers
//! `InvalidState` is re-checked against the booking: if the booking is
//! already confirmed with this payment, an earlier ambiguous attempt landed
//! and the retry is a recognized repeat, not a failure.

use std::sync::Arc;

use ticketline_core::clock::Clock;
use ticketline_core::error::DomainError;
use ticketline_core::retry::RetryPolicy;
use uuid::Uuid;

use crate::client::BookingClient;
use crate::model::{Payment, PaymentStatus};
use crate::reconciliation::{ReconciliationRecord, ReconciliationStore};
use crate::repository::PaymentRepository;

/// Input for processing a payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// The booking being paid for.
    pub booking_id: Uuid,
    /// The paying user; must match the booking.
    pub user_id: Uuid,
    /// Amount in minor currency units; must match the booking's total.
    pub amount: i64,
    /// How the payment is made.
    pub payment_method: String,
}

/// The payment processor.
pub struct PaymentService {
    repository: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingClient>,
    reconciliation: Arc<dyn ReconciliationStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl PaymentService {
    /// Creates the service over its storage, its outbound booking port, the
    /// reconciliation store, a clock and the confirm/cancel retry policy.
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingClient>,
        reconciliation: Arc<dyn ReconciliationStore>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            bookings,
            reconciliation,
            clock,
            retry,
        }
    }

    /// Takes a payment for a pending booking and confirms the booking.
    ///
    /// # Errors
    ///
    /// - `Validation` for a non-positive amount or empty method, before any
    ///   remote call.
    /// - `NotFound` / `ServiceUnavailable` from the booking lookup.
    /// - `InvalidBookingState` if the booking is not pending, already has a
    ///   payment, or the amount or user does not match.
    ///
    /// A failure to confirm the booking after the payment committed does
    /// not fail the call: the gap is recorded for reconciliation and the
    /// completed payment is returned.
    pub async fn process_payment(&self, request: PaymentRequest) -> Result<Payment, DomainError> {
        if request.amount <= 0 {
            return Err(DomainError::Validation("amount must be positive".into()));
        }
        if request.payment_method.trim().is_empty() {
            return Err(DomainError::Validation(
                "paymentMethod must not be empty".into(),
            ));
        }

        tracing::info!(booking_id = %request.booking_id, "validating booking");
        let booking = self.bookings.get_booking(request.booking_id).await?;

        if !booking.is_pending() {
            return Err(DomainError::InvalidBookingState(format!(
                "Booking is not in PENDING state. Current status: {}",
                booking.status
            )));
        }
        if let Some(existing) = booking.payment_id {
            return Err(DomainError::InvalidBookingState(format!(
                "Booking already has an associated payment: {existing}"
            )));
        }
        if booking.total_amount != request.amount {
            return Err(DomainError::InvalidBookingState(format!(
                "Amount mismatch. Booking: {}, Payment: {}",
                booking.total_amount, request.amount
            )));
        }
        if booking.user_id != request.user_id {
            return Err(DomainError::InvalidBookingState(
                "User ID does not match booking".into(),
            ));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: request.booking_id,
            user_id: request.user_id,
            amount: request.amount,
            status: PaymentStatus::Completed,
            payment_method: request.payment_method,
            transaction_id: Payment::new_transaction_id(),
            payment_date: self.clock.now(),
        };
        self.repository.insert_completed(payment.clone()).await?;
        tracing::info!(
            payment_id = %payment.id,
            transaction_id = %payment.transaction_id,
            "payment committed"
        );

        if let Err(err) = self.confirm_with_retry(request.booking_id, payment.id).await {
            tracing::error!(
                payment_id = %payment.id,
                booking_id = %request.booking_id,
                error = %err,
                "booking confirmation exhausted retries, recording for reconciliation"
            );
            let record = ReconciliationRecord {
                payment_id: payment.id,
                booking_id: request.booking_id,
                reason: err.to_string(),
                created_at: self.clock.now(),
            };
            if let Err(store_err) = self.reconciliation.record(record).await {
                tracing::error!(
                    payment_id = %payment.id,
                    error = %store_err,
                    "failed to persist reconciliation record"
                );
            }
        }

        Ok(payment)
    }

    /// Refunds a completed payment and cancels its booking.
    ///
    /// The booking cancel runs first: if it cannot be reached the payment
    /// stays `Completed` and the refund can be retried. A booking that is
    /// already cancelled is acceptable and the refund proceeds.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown payment, `InvalidState` unless the payment
    /// is `Completed`, `ServiceUnavailable` if the booking service stays
    /// unreachable.
    pub async fn refund_payment(&self, id: Uuid) -> Result<Payment, DomainError> {
        let payment = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Payment not found with id: {id}")))?;

        if payment.status != PaymentStatus::Completed {
            return Err(DomainError::InvalidState(
                "Can only refund completed payments".into(),
            ));
        }

        self.cancel_with_retry(payment.booking_id).await?;

        let refunded = self.repository.refund(id).await?;
        tracing::info!(payment_id = %id, booking_id = %payment.booking_id, "payment refunded");
        Ok(refunded)
    }

    /// Loads a payment by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the payment does not exist.
    pub async fn get_payment(&self, id: Uuid) -> Result<Payment, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Payment not found with id: {id}")))
    }

    /// Loads all payments.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn list_payments(&self) -> Result<Vec<Payment>, DomainError> {
        self.repository.list().await
    }

    /// Loads all payments made by one user.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>, DomainError> {
        self.repository.list_by_user(user_id).await
    }

    /// Loads a payment by its transaction token.
    ///
    /// # Errors
    ///
    /// `NotFound` if no payment carries the token.
    pub async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Payment, DomainError> {
        self.repository
            .get_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "Payment not found with transaction id: {transaction_id}"
                ))
            })
    }

    /// Loads all outstanding reconciliation records.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store fails.
    pub async fn list_reconciliation(&self) -> Result<Vec<ReconciliationRecord>, DomainError> {
        self.reconciliation.list().await
    }

    /// Confirms the booking under the retry policy, treating an
    /// already-applied confirmation as success.
    async fn confirm_with_retry(
        &self,
        booking_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut attempt = 0;
        loop {
            match self.bookings.confirm_booking(booking_id, payment_id).await {
                Ok(_) => return Ok(()),
                Err(DomainError::InvalidState(message)) => {
                    // An earlier attempt may have landed before its response
                    // was lost; the booking itself is the tiebreaker.
                    let booking = self.bookings.get_booking(booking_id).await?;
                    if booking.payment_id == Some(payment_id) {
                        tracing::info!(
                            %booking_id,
                            %payment_id,
                            "confirmation already applied by an earlier attempt"
                        );
                        return Ok(());
                    }
                    return Err(DomainError::InvalidState(message));
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        %booking_id,
                        attempt,
                        error = %err,
                        "booking confirmation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Cancels the booking under the retry policy, accepting an
    /// already-cancelled booking.
    async fn cancel_with_retry(&self, booking_id: Uuid) -> Result<(), DomainError> {
        let mut attempt = 0;
        loop {
            match self.bookings.cancel_booking(booking_id).await {
                Ok(()) => return Ok(()),
                Err(DomainError::InvalidState(message)) => {
                    let booking = self.bookings.get_booking(booking_id).await?;
                    if booking.is_cancelled() {
                        return Ok(());
                    }
                    return Err(DomainError::InvalidState(message));
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        %booking_id,
                        attempt,
                        error = %err,
                        "booking cancellation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::client::BookingSnapshot;
    use crate::reconciliation::InMemoryReconciliationStore;
    use crate::repository::InMemoryPaymentRepository;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    /// Booking client backed by a single in-memory booking snapshot. Records
    /// confirm and cancel calls and can simulate transient failures,
    /// including a confirm that applies but whose response is lost.
    struct StubBookingClient {
        booking: Mutex<BookingSnapshot>,
        gets: AtomicU32,
        confirm_failures: AtomicU32,
        lost_confirm_responses: AtomicU32,
        cancel_failures: AtomicU32,
        confirms: Mutex<Vec<(Uuid, Uuid)>>,
        cancels: Mutex<Vec<Uuid>>,
    }

    impl StubBookingClient {
        fn pending(total_amount: i64) -> Self {
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

        fn booking_id(&self) -> Uuid {
            self.booking.lock().unwrap().id
        }

        fn user_id(&self) -> Uuid {
            self.booking.lock().unwrap().user_id
        }

        fn total_amount(&self) -> i64 {
            self.booking.lock().unwrap().total_amount
        }

        fn snapshot(&self) -> BookingSnapshot {
            self.booking.lock().unwrap().clone()
        }

        fn set_status(&self, status: &str) {
            self.booking.lock().unwrap().status = status.to_owned();
        }

        fn set_payment_id(&self, payment_id: Option<Uuid>) {
            self.booking.lock().unwrap().payment_id = payment_id;
        }

        /// Makes the next `count` confirm calls fail with
        /// `ServiceUnavailable` without applying.
        fn fail_next_confirms(&self, count: u32) {
            self.confirm_failures.store(count, Ordering::SeqCst);
        }

        /// Makes the next `count` confirm calls apply but answer with
        /// `ServiceUnavailable`, as a dropped response would.
        fn lose_next_confirm_responses(&self, count: u32) {
            self.lost_confirm_responses.store(count, Ordering::SeqCst);
        }

        /// Makes the next `count` cancel calls fail with
        /// `ServiceUnavailable`.
        fn fail_next_cancels(&self, count: u32) {
            self.cancel_failures.store(count, Ordering::SeqCst);
        }

        fn confirmed_calls(&self) -> Vec<(Uuid, Uuid)> {
            self.confirms.lock().unwrap().clone()
        }

        fn cancelled_calls(&self) -> Vec<Uuid> {
            self.cancels.lock().unwrap().clone()
        }

        fn get_calls(&self) -> u32 {
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

    /// Booking client whose every call fails with `ServiceUnavailable`.
    #[derive(Debug, Default)]
    struct UnavailableBookingClient;

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

    struct Fixture {
        repository: Arc<InMemoryPaymentRepository>,
        bookings: Arc<StubBookingClient>,
        reconciliation: Arc<InMemoryReconciliationStore>,
        service: PaymentService,
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
        }
    }

    fn fixture(bookings: Arc<StubBookingClient>) -> Fixture {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let reconciliation = Arc::new(InMemoryReconciliationStore::new());
        let service = PaymentService::new(
            repository.clone(),
            bookings.clone(),
            reconciliation.clone(),
            fixed_clock(),
            fast_retry(),
        );
        Fixture {
            repository,
            bookings,
            reconciliation,
            service,
        }
    }

    fn request_for(bookings: &StubBookingClient) -> PaymentRequest {
        PaymentRequest {
            booking_id: bookings.booking_id(),
            user_id: bookings.user_id(),
            amount: bookings.total_amount(),
            payment_method: "CREDIT_CARD".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_process_payment_commits_and_confirms() {
        let fx = fixture(Arc::new(StubBookingClient::pending(9000)));
        let request = request_for(&fx.bookings);

        let payment = fx.service.process_payment(request).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.transaction_id.starts_with("TXN-"));
        assert_eq!(payment.amount, 9000);
        let confirms = fx.bookings.confirmed_calls();
        assert_eq!(confirms, vec![(fx.bookings.booking_id(), payment.id)]);
        assert!(fx.reconciliation.list().await.unwrap().is_empty());
        assert!(fx.repository.get(payment.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_process_payment_rejects_non_positive_amount_before_any_call() {
        let fx = fixture(Arc::new(StubBookingClient::pending(9000)));
        let mut request = request_for(&fx.bookings);
        request.amount = 0;

        let err = fx.service.process_payment(request).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(fx.bookings.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_process_payment_rejects_non_pending_booking() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        bookings.set_status("CANCELLED");
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);

        let err = fx.service.process_payment(request).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidBookingState(_)));
        assert!(fx.repository.list().await.unwrap().is_empty());
        assert!(fx.bookings.confirmed_calls().is_empty());
    }

    #[tokio::test]
    async fn test_process_payment_rejects_duplicate_payment() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        bookings.set_payment_id(Some(Uuid::new_v4()));
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);

        let err = fx.service.process_payment(request).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidBookingState(_)));
        assert!(fx.repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_payment_rejects_amount_mismatch() {
        let fx = fixture(Arc::new(StubBookingClient::pending(9000)));
        let mut request = request_for(&fx.bookings);
        request.amount = 8000;

        let err = fx.service.process_payment(request).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidBookingState(_)));
        assert!(fx.repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_payment_rejects_user_mismatch() {
        let fx = fixture(Arc::new(StubBookingClient::pending(9000)));
        let mut request = request_for(&fx.bookings);
        request.user_id = Uuid::new_v4();

        let err = fx.service.process_payment(request).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidBookingState(_)));
    }

    #[tokio::test]
    async fn test_process_payment_surfaces_booking_outage() {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let service = PaymentService::new(
            repository.clone(),
            Arc::new(UnavailableBookingClient),
            Arc::new(InMemoryReconciliationStore::new()),
            fixed_clock(),
            fast_retry(),
        );

        let err = service
            .process_payment(PaymentRequest {
                booking_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                amount: 100,
                payment_method: "CREDIT_CARD".to_owned(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ServiceUnavailable(_)));
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_confirm_failure_is_retried_to_success() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        bookings.fail_next_confirms(1);
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);

        let payment = fx.service.process_payment(request).await.unwrap();

        assert_eq!(fx.bookings.confirmed_calls(), vec![(
            fx.bookings.booking_id(),
            payment.id
        )]);
        assert!(fx.reconciliation.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_confirm_retries_record_reconciliation() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        bookings.fail_next_confirms(u32::MAX);
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);

        let payment = fx.service.process_payment(request).await.unwrap();

        // The payment is committed even though the booking never confirmed.
        assert_eq!(payment.status, PaymentStatus::Completed);
        let records = fx.reconciliation.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payment_id, payment.id);
        assert_eq!(records[0].booking_id, fx.bookings.booking_id());
    }

    #[tokio::test]
    async fn test_ambiguous_confirm_is_recognized_as_applied() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        // The first confirm applies but its response is lost.
        bookings.lose_next_confirm_responses(1);
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);

        let payment = fx.service.process_payment(request).await.unwrap();

        assert!(fx.reconciliation.list().await.unwrap().is_empty());
        assert_eq!(fx.bookings.snapshot().payment_id, Some(payment.id));
    }

    #[tokio::test]
    async fn test_refund_cancels_booking_and_marks_refunded() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);
        let payment = fx.service.process_payment(request).await.unwrap();

        let refunded = fx.service.refund_payment(payment.id).await.unwrap();

        assert_eq!(refunded.status, PaymentStatus::Refunded);
        assert_eq!(fx.bookings.cancelled_calls(), vec![fx.bookings.booking_id()]);
    }

    #[tokio::test]
    async fn test_refund_of_refunded_payment_is_rejected() {
        let fx = fixture(Arc::new(StubBookingClient::pending(9000)));
        let request = request_for(&fx.bookings);
        let payment = fx.service.process_payment(request).await.unwrap();
        fx.service.refund_payment(payment.id).await.unwrap();

        let err = fx.service.refund_payment(payment.id).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(fx.bookings.cancelled_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refund_accepts_already_cancelled_booking() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);
        let payment = fx.service.process_payment(request).await.unwrap();
        fx.bookings.set_status("CANCELLED");

        let refunded = fx.service.refund_payment(payment.id).await.unwrap();

        assert_eq!(refunded.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_refund_leaves_payment_untouched_when_cancel_exhausts() {
        let bookings = Arc::new(StubBookingClient::pending(9000));
        let fx = fixture(bookings);
        let request = request_for(&fx.bookings);
        let payment = fx.service.process_payment(request).await.unwrap();
        fx.bookings.fail_next_cancels(u32::MAX);

        let err = fx.service.refund_payment(payment.id).await.unwrap_err();

        assert!(matches!(err, DomainError::ServiceUnavailable(_)));
        let stored = fx.repository.get(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Completed);
    }
}

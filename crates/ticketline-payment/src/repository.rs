//! Payment repository abstraction and in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ticketline_core::error::DomainError;
use uuid::Uuid;

use crate::model::{Payment, PaymentStatus};

/// Storage port for the payment processor.
///
/// The one-completed-payment-per-booking invariant is enforced here, inside
/// the store, so it holds even if two process-payment calls race past the
/// coordinator-level validation.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new `Completed` payment. Fails with
    /// `InvalidBookingState` if the booking already has a completed payment.
    async fn insert_completed(&self, payment: Payment) -> Result<(), DomainError>;

    /// Loads a payment by id.
    async fn get(&self, id: Uuid) -> Result<Option<Payment>, DomainError>;

    /// Loads all payments.
    async fn list(&self) -> Result<Vec<Payment>, DomainError>;

    /// Loads all payments made by one user.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>, DomainError>;

    /// Loads a payment by its transaction token.
    async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Transitions `Completed` → `Refunded`.
    async fn refund(&self, id: Uuid) -> Result<Payment, DomainError>;
}

/// In-memory payment repository for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<Uuid, Payment>>,
}

impl InMemoryPaymentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Payment>> {
        self.payments.lock().expect("payment repository lock poisoned")
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert_completed(&self, payment: Payment) -> Result<(), DomainError> {
        let mut payments = self.lock();
        let duplicate = payments.values().any(|existing| {
            existing.booking_id == payment.booking_id
                && existing.status == PaymentStatus::Completed
        });
        if duplicate {
            return Err(DomainError::InvalidBookingState(format!(
                "Booking {} already has a completed payment",
                payment.booking_id
            )));
        }
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, DomainError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Payment>, DomainError> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>, DomainError> {
        Ok(self
            .lock()
            .values()
            .filter(|payment| payment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .lock()
            .values()
            .find(|payment| payment.transaction_id == transaction_id)
            .cloned())
    }

    async fn refund(&self, id: Uuid) -> Result<Payment, DomainError> {
        let mut payments = self.lock();
        let Some(payment) = payments.get_mut(&id) else {
            return Err(DomainError::NotFound(format!(
                "Payment not found with id: {id}"
            )));
        };
        if payment.status != PaymentStatus::Completed {
            return Err(DomainError::InvalidState(
                "Can only refund completed payments".into(),
            ));
        }
        payment.status = PaymentStatus::Refunded;
        Ok(payment.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn completed_payment(booking_id: Uuid) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            booking_id,
            user_id: Uuid::new_v4(),
            amount: 9000,
            status: PaymentStatus::Completed,
            payment_method: "CREDIT_CARD".to_owned(),
            transaction_id: Payment::new_transaction_id(),
            payment_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_second_completed_payment_for_same_booking_is_rejected() {
        let repository = InMemoryPaymentRepository::new();
        let booking_id = Uuid::new_v4();

        repository
            .insert_completed(completed_payment(booking_id))
            .await
            .unwrap();
        let err = repository
            .insert_completed(completed_payment(booking_id))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidBookingState(_)));
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refunded_booking_can_be_paid_again() {
        let repository = InMemoryPaymentRepository::new();
        let booking_id = Uuid::new_v4();
        let first = completed_payment(booking_id);
        repository.insert_completed(first.clone()).await.unwrap();
        repository.refund(first.id).await.unwrap();

        repository
            .insert_completed(completed_payment(booking_id))
            .await
            .unwrap();

        assert_eq!(repository.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refund_is_rejected_for_already_refunded_payment() {
        let repository = InMemoryPaymentRepository::new();
        let payment = completed_payment(Uuid::new_v4());
        repository.insert_completed(payment.clone()).await.unwrap();
        repository.refund(payment.id).await.unwrap();

        let err = repository.refund(payment.id).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_lookup_by_transaction_id() {
        let repository = InMemoryPaymentRepository::new();
        let payment = completed_payment(Uuid::new_v4());
        repository.insert_completed(payment.clone()).await.unwrap();

        let found = repository
            .get_by_transaction_id(&payment.transaction_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, payment.id);
        assert!(repository
            .get_by_transaction_id("TXN-unknown")
            .await
            .unwrap()
            .is_none());
    }
}

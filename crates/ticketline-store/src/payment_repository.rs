//! `PostgreSQL` implementation of the payment repository.
//!
//! The one-completed-payment-per-booking rule is enforced by a partial
//! unique index on `payments (booking_id) WHERE status = 'COMPLETED'`, so
//! two concurrent payment attempts against the same booking cannot both
//! commit.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ticketline_core::error::DomainError;
use ticketline_payment::model::{Payment, PaymentStatus};
use ticketline_payment::repository::PaymentRepository;

use crate::db_error;

/// `PostgreSQL`-backed payment repository.
#[derive(Debug, Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Creates a new `PgPaymentRepository`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn payment_from_row(row: &PgRow) -> Result<Payment, DomainError> {
    let status: String = row.try_get("status").map_err(|e| db_error(&e))?;
    Ok(Payment {
        id: row.try_get("id").map_err(|e| db_error(&e))?,
        booking_id: row.try_get("booking_id").map_err(|e| db_error(&e))?,
        user_id: row.try_get("user_id").map_err(|e| db_error(&e))?,
        amount: row.try_get("amount").map_err(|e| db_error(&e))?,
        status: PaymentStatus::parse(&status).map_err(DomainError::Internal)?,
        payment_method: row.try_get("payment_method").map_err(|e| db_error(&e))?,
        transaction_id: row.try_get("transaction_id").map_err(|e| db_error(&e))?,
        payment_date: row.try_get("payment_date").map_err(|e| db_error(&e))?,
    })
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert_completed(&self, payment: Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r"
            INSERT INTO payments
                (id, booking_id, user_id, amount, status, payment_method,
                 transaction_id, payment_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.status.as_str())
        .bind(&payment.payment_method)
        .bind(&payment.transaction_id)
        .bind(payment.payment_date)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(sqlx::error::DatabaseError::is_unique_violation) =>
            {
                Err(DomainError::InvalidBookingState(format!(
                    "Booking {} already has a completed payment",
                    payment.booking_id
                )))
            }
            Err(err) => Err(db_error(&err)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, DomainError> {
        sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .map(|row| payment_from_row(&row))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Payment>, DomainError> {
        sqlx::query("SELECT * FROM payments ORDER BY payment_date")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(payment_from_row)
            .collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>, DomainError> {
        sqlx::query("SELECT * FROM payments WHERE user_id = $1 ORDER BY payment_date")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(payment_from_row)
            .collect()
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        sqlx::query("SELECT * FROM payments WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .map(|row| payment_from_row(&row))
            .transpose()
    }

    async fn refund(&self, id: Uuid) -> Result<Payment, DomainError> {
        let updated = sqlx::query(
            r"
            UPDATE payments
            SET status = 'REFUNDED'
            WHERE id = $1 AND status = 'COMPLETED'
            RETURNING *
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        match updated {
            Some(row) => payment_from_row(&row),
            None => {
                let exists = sqlx::query("SELECT 1 FROM payments WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| db_error(&e))?;
                if exists.is_some() {
                    Err(DomainError::InvalidState(
                        "Can only refund completed payments".into(),
                    ))
                } else {
                    Err(DomainError::NotFound(format!(
                        "Payment not found with id: {id}"
                    )))
                }
            }
        }
    }
}

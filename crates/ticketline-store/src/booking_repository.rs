//! `PostgreSQL` implementation of the booking repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ticketline_booking::model::{Booking, BookingStatus};
use ticketline_booking::repository::BookingRepository;
use ticketline_core::error::DomainError;

use crate::{db_error, seats_from_db};

/// `PostgreSQL`-backed booking repository.
#[derive(Debug, Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Creates a new `PgBookingRepository`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn status_of(&self, id: Uuid) -> Result<Option<String>, DomainError> {
        let row = sqlx::query("SELECT status FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?;
        row.map(|r| r.try_get("status").map_err(|e| db_error(&e)))
            .transpose()
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking, DomainError> {
    let status: String = row.try_get("status").map_err(|e| db_error(&e))?;
    Ok(Booking {
        id: row.try_get("id").map_err(|e| db_error(&e))?,
        user_id: row.try_get("user_id").map_err(|e| db_error(&e))?,
        event_id: row.try_get("event_id").map_err(|e| db_error(&e))?,
        number_of_tickets: seats_from_db(
            row.try_get("number_of_tickets").map_err(|e| db_error(&e))?,
            "number_of_tickets",
        )?,
        total_amount: row.try_get("total_amount").map_err(|e| db_error(&e))?,
        status: BookingStatus::parse(&status).map_err(DomainError::Internal)?,
        payment_id: row.try_get("payment_id").map_err(|e| db_error(&e))?,
        reservation_ref: row.try_get("reservation_ref").map_err(|e| db_error(&e))?,
        booking_date: row.try_get("booking_date").map_err(|e| db_error(&e))?,
        updated_at: row.try_get("updated_at").map_err(|e| db_error(&e))?,
    })
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO bookings
                (id, user_id, event_id, number_of_tickets, total_amount, status,
                 payment_id, reservation_ref, booking_date, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(i64::from(booking.number_of_tickets))
        .bind(booking.total_amount)
        .bind(booking.status.as_str())
        .bind(booking.payment_id)
        .bind(booking.reservation_ref)
        .bind(booking.booking_date)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, DomainError> {
        sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .map(|row| booking_from_row(&row))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Booking>, DomainError> {
        sqlx::query("SELECT * FROM bookings ORDER BY booking_date")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(booking_from_row)
            .collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, DomainError> {
        sqlx::query("SELECT * FROM bookings WHERE user_id = $1 ORDER BY booking_date")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(booking_from_row)
            .collect()
    }

    async fn confirm(
        &self,
        id: Uuid,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        let updated = sqlx::query(
            r"
            UPDATE bookings
            SET status = 'CONFIRMED', payment_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            ",
        )
        .bind(id)
        .bind(payment_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        match updated {
            Some(row) => booking_from_row(&row),
            None => match self.status_of(id).await? {
                Some(status) => Err(DomainError::InvalidState(format!(
                    "booking {id} cannot be confirmed from status {status}"
                ))),
                None => Err(DomainError::NotFound(format!(
                    "Booking not found with id: {id}"
                ))),
            },
        }
    }

    async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> Result<Booking, DomainError> {
        let updated = sqlx::query(
            r"
            UPDATE bookings
            SET status = 'CANCELLED', updated_at = $2
            WHERE id = $1 AND status IN ('PENDING', 'CONFIRMED')
            RETURNING *
            ",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        match updated {
            Some(row) => booking_from_row(&row),
            None => match self.status_of(id).await? {
                Some(status) => Err(DomainError::InvalidState(format!(
                    "booking {id} cannot be cancelled from status {status}"
                ))),
                None => Err(DomainError::NotFound(format!(
                    "Booking not found with id: {id}"
                ))),
            },
        }
    }
}

//! `PostgreSQL` implementation of the catalog's [`EventStore`].
//!
//! Seat reservations are idempotent through the `seat_reservations` ledger:
//! one row per `reservation_ref`, inserted with `ON CONFLICT DO NOTHING` so
//! a retried reserve (or a release that arrives before its reserve) is
//! recognized instead of applied twice. The decrement itself is one
//! conditional `UPDATE`, which keeps concurrent reservations from ever
//! overselling an event.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use ticketline_catalog::model::{Event, EventStatus};
use ticketline_catalog::store::EventStore;
use ticketline_core::error::DomainError;

use crate::{db_error, seats_from_db};

/// `PostgreSQL`-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn event_from_row(row: &PgRow) -> Result<Event, DomainError> {
    let status: String = row.try_get("status").map_err(|e| db_error(&e))?;
    Ok(Event {
        id: row.try_get("id").map_err(|e| db_error(&e))?,
        name: row.try_get("name").map_err(|e| db_error(&e))?,
        capacity: seats_from_db(row.try_get("capacity").map_err(|e| db_error(&e))?, "capacity")?,
        available_seats: seats_from_db(
            row.try_get("available_seats").map_err(|e| db_error(&e))?,
            "available_seats",
        )?,
        price: row.try_get("price").map_err(|e| db_error(&e))?,
        status: EventStatus::parse(&status).map_err(DomainError::Internal)?,
        created_at: row.try_get("created_at").map_err(|e| db_error(&e))?,
        updated_at: row.try_get("updated_at").map_err(|e| db_error(&e))?,
    })
}

/// Reads the current seat count inside the transaction, for the replay path
/// where no decrement is applied.
async fn current_seats(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<u32, DomainError> {
    let row = sqlx::query("SELECT available_seats FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_error(&e))?
        .ok_or_else(|| DomainError::NotFound(format!("Event not found with id: {event_id}")))?;
    seats_from_db(
        row.try_get("available_seats").map_err(|e| db_error(&e))?,
        "available_seats",
    )
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: Event) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO events
                (id, name, capacity, available_seats, price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(i64::from(event.capacity))
        .bind(i64::from(event.available_seats))
        .bind(event.price)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, DomainError> {
        sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .map(|row| event_from_row(&row))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Event>, DomainError> {
        sqlx::query("SELECT * FROM events ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(event_from_row)
            .collect()
    }

    async fn update(&self, event: Event) -> Result<(), DomainError> {
        // available_seats is deliberately left out: only the reservation
        // operations may touch it.
        let result = sqlx::query(
            r"
            UPDATE events
            SET name = $2, capacity = $3, price = $4, status = $5, updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(i64::from(event.capacity))
        .bind(event.price)
        .bind(event.status.as_str())
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {}",
                event.id
            )));
        }
        Ok(())
    }

    async fn reserve_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error(&e))?;

        let inserted = sqlx::query(
            r"
            INSERT INTO seat_reservations (reservation_ref, event_id, seats, released)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (reservation_ref) DO NOTHING
            ",
        )
        .bind(reservation_ref)
        .bind(event_id)
        .bind(i64::from(seats))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        if inserted.rows_affected() == 0 {
            // Recognized repeat of an applied (or already compensated)
            // reservation: report the current count, apply nothing.
            let remaining = current_seats(&mut tx, event_id).await?;
            tx.commit().await.map_err(|e| db_error(&e))?;
            return Ok(remaining);
        }

        let updated = sqlx::query(
            r"
            UPDATE events
            SET available_seats = available_seats - $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PUBLISHED' AND available_seats >= $2
            RETURNING available_seats
            ",
        )
        .bind(event_id)
        .bind(i64::from(seats))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        if let Some(row) = updated {
            let remaining = seats_from_db(
                row.try_get("available_seats").map_err(|e| db_error(&e))?,
                "available_seats",
            )?;
            tx.commit().await.map_err(|e| db_error(&e))?;
            return Ok(remaining);
        }

        // The conditional update matched nothing. Work out which
        // precondition failed, then roll back so the ledger row is not kept.
        let event = sqlx::query("SELECT status, available_seats FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(&e))?;
        tx.rollback().await.map_err(|e| db_error(&e))?;

        match event {
            None => Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            ))),
            Some(row) => {
                let status: String = row.try_get("status").map_err(|e| db_error(&e))?;
                if status != EventStatus::Published.as_str() {
                    return Err(DomainError::EventNotPublished { event_id, status });
                }
                let available = seats_from_db(
                    row.try_get("available_seats").map_err(|e| db_error(&e))?,
                    "available_seats",
                )?;
                Err(DomainError::InsufficientSeats {
                    requested: seats,
                    available,
                })
            }
        }
    }

    async fn release_seats(
        &self,
        event_id: Uuid,
        seats: u32,
        reservation_ref: Uuid,
    ) -> Result<u32, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error(&e))?;

        let existing = sqlx::query(
            "SELECT seats, released FROM seat_reservations WHERE reservation_ref = $1 FOR UPDATE",
        )
        .bind(reservation_ref)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        let credit: i64 = match existing {
            Some(row) => {
                let released: bool = row.try_get("released").map_err(|e| db_error(&e))?;
                if released {
                    0
                } else {
                    sqlx::query(
                        "UPDATE seat_reservations SET released = TRUE WHERE reservation_ref = $1",
                    )
                    .bind(reservation_ref)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| db_error(&e))?;
                    row.try_get("seats").map_err(|e| db_error(&e))?
                }
            }
            None => {
                // Release observed before (or without) its reservation: mark
                // the ref consumed so a late-arriving reserve becomes a
                // no-op repeat instead of a second decrement.
                let inserted = sqlx::query(
                    r"
                    INSERT INTO seat_reservations (reservation_ref, event_id, seats, released)
                    VALUES ($1, $2, $3, TRUE)
                    ON CONFLICT (reservation_ref) DO NOTHING
                    ",
                )
                .bind(reservation_ref)
                .bind(event_id)
                .bind(i64::from(seats))
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error(&e))?;
                if inserted.rows_affected() == 0 {
                    0
                } else {
                    i64::from(seats)
                }
            }
        };

        let updated = sqlx::query(
            r"
            UPDATE events
            SET available_seats = LEAST(available_seats + $2, capacity), updated_at = NOW()
            WHERE id = $1
            RETURNING available_seats
            ",
        )
        .bind(event_id)
        .bind(credit)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(&e))?;

        let Some(row) = updated else {
            tx.rollback().await.map_err(|e| db_error(&e))?;
            return Err(DomainError::NotFound(format!(
                "Event not found with id: {event_id}"
            )));
        };
        let remaining = seats_from_db(
            row.try_get("available_seats").map_err(|e| db_error(&e))?,
            "available_seats",
        )?;
        tx.commit().await.map_err(|e| db_error(&e))?;
        Ok(remaining)
    }
}

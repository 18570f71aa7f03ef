//! `PostgreSQL` implementation of the reconciliation store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use ticketline_core::error::DomainError;
use ticketline_payment::reconciliation::{ReconciliationRecord, ReconciliationStore};

use crate::db_error;

/// `PostgreSQL`-backed reconciliation store.
#[derive(Debug, Clone)]
pub struct PgReconciliationStore {
    pool: PgPool,
}

impl PgReconciliationStore {
    /// Creates a new `PgReconciliationStore`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReconciliationStore for PgReconciliationStore {
    async fn record(&self, record: ReconciliationRecord) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO reconciliations (payment_id, booking_id, reason, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(record.payment_id)
        .bind(record.booking_id)
        .bind(&record.reason)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&e))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReconciliationRecord>, DomainError> {
        sqlx::query("SELECT * FROM reconciliations ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&e))?
            .iter()
            .map(|row| {
                Ok(ReconciliationRecord {
                    payment_id: row.try_get("payment_id").map_err(|e| db_error(&e))?,
                    booking_id: row.try_get("booking_id").map_err(|e| db_error(&e))?,
                    reason: row.try_get("reason").map_err(|e| db_error(&e))?,
                    created_at: row.try_get("created_at").map_err(|e| db_error(&e))?,
                })
            })
            .collect()
    }
}

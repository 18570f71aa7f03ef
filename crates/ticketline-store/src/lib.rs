//! `PostgreSQL`-backed implementations of the storage ports.
//!
//! Each repository wraps a [`sqlx::PgPool`] and mirrors the semantics of the
//! in-memory implementation it replaces. Conditional state transitions
//! (seat reservation, booking confirm and cancel, refund) are single
//! conditional `UPDATE` statements so they stay atomic under concurrency.

pub mod booking_repository;
pub mod event_store;
pub mod payment_repository;
pub mod reconciliation_store;

pub use booking_repository::PgBookingRepository;
pub use event_store::PgEventStore;
pub use payment_repository::PgPaymentRepository;
pub use reconciliation_store::PgReconciliationStore;

use sqlx::PgPool;
use ticketline_core::error::DomainError;

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// Returns [`DomainError::Internal`] if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| DomainError::Internal(format!("migration failed: {err}")))
}

pub(crate) fn db_error(err: &sqlx::Error) -> DomainError {
    DomainError::Internal(format!("database error: {err}"))
}

/// Converts a seat count column (stored as `BIGINT`) back to the domain's
/// `u32` representation.
pub(crate) fn seats_from_db(value: i64, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::Internal(format!("corrupt {column} value: {value}")))
}

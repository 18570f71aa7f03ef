//! Reconciliation records for payments whose booking confirmation never
//! landed.
//!
//! A committed payment with an unconfirmed booking is an open inconsistency
//! window. When the bounded confirm retries exhaust, the gap is recorded
//! durably here for out-of-band correction instead of being swallowed.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_core::error::DomainError;
use uuid::Uuid;

/// A payment that needs manual or scheduled reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    /// The committed payment.
    pub payment_id: Uuid,
    /// The booking that failed to confirm.
    pub booking_id: Uuid,
    /// The last error seen before giving up.
    pub reason: String,
    /// When the retries exhausted.
    pub created_at: DateTime<Utc>,
}

/// Storage port for reconciliation records.
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Persists a record.
    async fn record(&self, record: ReconciliationRecord) -> Result<(), DomainError>;

    /// Loads all outstanding records.
    async fn list(&self) -> Result<Vec<ReconciliationRecord>, DomainError>;
}

/// In-memory reconciliation store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryReconciliationStore {
    records: Mutex<Vec<ReconciliationRecord>>,
}

impl InMemoryReconciliationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReconciliationStore for InMemoryReconciliationStore {
    async fn record(&self, record: ReconciliationRecord) -> Result<(), DomainError> {
        self.records
            .lock()
            .expect("reconciliation store lock poisoned")
            .push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReconciliationRecord>, DomainError> {
        Ok(self
            .records
            .lock()
            .expect("reconciliation store lock poisoned")
            .clone())
    }
}

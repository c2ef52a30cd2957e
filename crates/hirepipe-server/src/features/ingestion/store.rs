//! Persistence seam for the ingestion pipeline
//!
//! The pipeline only needs a transaction that can answer set-membership
//! lookups, insert one record at a time and commit or roll back. The Postgres
//! implementation lives in [`super::postgres`].

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use super::record::ValidatedRecord;
use super::schema::ReferenceKind;

/// Failure talking to the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Connection-level failures (pool exhausted or closed, socket errors) mean
/// the store could not be reached; everything else came back from Postgres.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            },
            other => Self::Database(other),
        }
    }
}

/// Opens ingestion transactions
#[async_trait]
pub trait IngestStore: Send + Sync {
    type Transaction: IngestTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError>;
}

/// One open transaction against the store
///
/// Dropping a transaction without committing discards everything written
/// through it.
#[async_trait]
pub trait IngestTransaction: Send {
    /// Returns the subset of `ids` that exist in the referenced table.
    async fn existing_ids(
        &mut self,
        kind: ReferenceKind,
        ids: &[i32],
    ) -> Result<HashSet<i32>, StoreError>;

    /// Inserts one record and returns the id the store assigned to it.
    async fn insert_returning_id(&mut self, record: &ValidatedRecord) -> Result<i32, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

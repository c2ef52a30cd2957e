//! Postgres-backed ingestion store

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::record::ValidatedRecord;
use super::schema::ReferenceKind;
use super::store::{IngestStore, IngestTransaction, StoreError};

/// [`IngestStore`] over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgIngestStore {
    pool: PgPool,
}

impl PgIngestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IngestStore for PgIngestStore {
    type Transaction = PgIngestTransaction;

    async fn begin(&self) -> Result<PgIngestTransaction, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgIngestTransaction { tx })
    }
}

/// A pooled connection with an open transaction
pub struct PgIngestTransaction {
    tx: Transaction<'static, Postgres>,
}

fn existing_ids_sql(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Department => "SELECT id FROM departments WHERE id = ANY($1)",
        ReferenceKind::Job => "SELECT id FROM jobs WHERE id = ANY($1)",
    }
}

#[async_trait]
impl IngestTransaction for PgIngestTransaction {
    async fn existing_ids(
        &mut self,
        kind: ReferenceKind,
        ids: &[i32],
    ) -> Result<HashSet<i32>, StoreError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<i32> = sqlx::query_scalar(existing_ids_sql(kind))
            .bind(ids)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(found.into_iter().collect())
    }

    async fn insert_returning_id(&mut self, record: &ValidatedRecord) -> Result<i32, StoreError> {
        let sql = record.entity().insert_sql();

        let query = match record {
            ValidatedRecord::Department { department } => {
                sqlx::query_scalar::<_, i32>(sql).bind(department.as_str())
            },
            ValidatedRecord::Job { job } => sqlx::query_scalar::<_, i32>(sql).bind(job.as_str()),
            ValidatedRecord::HiredEmployee(event) => sqlx::query_scalar::<_, i32>(sql)
                .bind(event.name.as_str())
                .bind(event.hire_datetime)
                .bind(event.department_id)
                .bind(event.job_id),
        };

        let id = query.fetch_one(&mut *self.tx).await?;
        Ok(id)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

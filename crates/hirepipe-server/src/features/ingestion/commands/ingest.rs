//! Ingest records command
//!
//! Validates a batch of loosely typed records for one table, checks hire-event
//! references in bulk, commits the valid subset atomically and reports the
//! rejected records back to the caller verbatim.
//!
//! # Flow
//!
//! 1. Resolve the table name. Unknown names fail before the store is touched.
//! 2. Open one transaction.
//! 3. Validate every record, then batch-check references.
//! 4. Commit the valid subset, if any.
//! 5. Report how many rows were inserted and which records were rejected.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::ingestion::committer::commit_batch;
use crate::features::ingestion::postgres::PgIngestStore;
use crate::features::ingestion::record::{Rejection, SubmittedRecord, ValidatedRecord};
use crate::features::ingestion::referential::ReferenceSet;
use crate::features::ingestion::schema::TargetEntity;
use crate::features::ingestion::store::{IngestStore, IngestTransaction, StoreError};
use crate::features::ingestion::validator::validate_record;

/// Command to ingest a batch of records into one table
///
/// # Examples
///
/// ```rust,ignore
/// use hirepipe_server::features::ingestion::commands::IngestRecordsCommand;
///
/// let command: IngestRecordsCommand = serde_json::from_str(
///     r#"{"table": "departments", "data": [{"department": "Sales"}, {"department": "Research"}]}"#,
/// )?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecordsCommand {
    /// Target table: `departments`, `jobs` or `hired_employees`
    #[serde(alias = "target_entity")]
    pub table: String,

    /// Records in submission order
    #[serde(alias = "records")]
    pub data: Vec<SubmittedRecord>,
}

/// Result of one ingestion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    /// True when at least one record was inserted
    pub success: bool,
    pub message: String,
    /// Rejected records, verbatim and in submission order
    pub failed_records: Vec<SubmittedRecord>,
}

/// Errors that abort an ingestion call
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unknown table '{0}'. Must be one of: departments, jobs, hired_employees")]
    UnknownEntity(String),

    #[error("Store unavailable while ingesting into {entity}: {source}")]
    StoreUnavailable {
        entity: TargetEntity,
        #[source]
        source: StoreError,
    },

    #[error("Failed to insert {attempted} records into {entity}: {source}")]
    CommitFailure {
        entity: TargetEntity,
        attempted: usize,
        #[source]
        source: StoreError,
    },
}

/// Handler for the ingest command against Postgres
#[tracing::instrument(
    skip(pool, command),
    fields(table = %command.table, records = command.data.len())
)]
pub async fn handle(
    pool: PgPool,
    command: IngestRecordsCommand,
) -> Result<IngestionOutcome, IngestError> {
    let store = PgIngestStore::new(pool);
    ingest(&store, command).await
}

/// Run the ingestion pipeline against any store.
pub async fn ingest<S: IngestStore>(
    store: &S,
    command: IngestRecordsCommand,
) -> Result<IngestionOutcome, IngestError> {
    let entity: TargetEntity = command
        .table
        .parse()
        .map_err(|_| IngestError::UnknownEntity(command.table.clone()))?;

    let mut tx = store
        .begin()
        .await
        .map_err(|source| IngestError::StoreUnavailable { entity, source })?;

    let mut valid: Vec<(usize, ValidatedRecord)> = Vec::with_capacity(command.data.len());
    let mut rejected: Vec<(usize, Rejection)> = Vec::new();

    for (index, raw) in command.data.iter().enumerate() {
        match validate_record(entity, raw.fields()) {
            Ok(record) => valid.push((index, record)),
            Err(reason) => rejected.push((index, reason)),
        }
    }

    if entity.has_references() && !valid.is_empty() {
        let references = ReferenceSet::load(&mut tx, &valid)
            .await
            .map_err(|source| IngestError::StoreUnavailable { entity, source })?;

        let (kept, dangling): (Vec<_>, Vec<_>) = valid
            .into_iter()
            .map(|(index, record)| match references.check(&record) {
                Ok(()) => Ok((index, record)),
                Err(reason) => Err((index, reason)),
            })
            .partition(Result::is_ok);

        valid = kept.into_iter().filter_map(Result::ok).collect();
        rejected.extend(dangling.into_iter().filter_map(Result::err));
        rejected.sort_by_key(|(index, _)| *index);
    }

    for (index, reason) in &rejected {
        tracing::warn!(
            index,
            reason = %reason,
            structural = reason.is_structural(),
            "Record rejected"
        );
    }

    let inserted = valid.len();
    if valid.is_empty() {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "Failed to release empty ingestion transaction");
        }
    } else {
        let records: Vec<ValidatedRecord> = valid.into_iter().map(|(_, record)| record).collect();
        commit_batch(tx, entity, &records).await?;
    }

    let failed_records: Vec<SubmittedRecord> = rejected
        .iter()
        .map(|(index, _)| command.data[*index].clone())
        .collect();

    tracing::info!(
        entity = %entity,
        inserted,
        rejected = failed_records.len(),
        "Ingestion completed"
    );

    Ok(IngestionOutcome {
        success: inserted > 0,
        message: format!("{} records inserted into {}", inserted, entity),
        failed_records,
    })
}

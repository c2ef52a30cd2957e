//! One-shot load of the historical CSV exports
//!
//! Reads `departments.csv`, `jobs.csv` and `hired_employees.csv` from the
//! migration bucket and writes all three tables in a single transaction.
//! Unusable lines are collected and uploaded to [`FAILED_RECORDS_KEY`].

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::tables::reset_sequence;
use crate::features::ingestion::TargetEntity;
use crate::storage::Storage;

pub mod parser;

pub use parser::{parse_csv, ParsedCsv, RejectedLine};

/// Object key receiving rejected CSV lines
pub const FAILED_RECORDS_KEY: &str = "logs/failed_records.log";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed CSV in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
}

impl From<anyhow::Error> for MigrationError {
    fn from(err: anyhow::Error) -> Self {
        MigrationError::Storage(format!("{err:#}"))
    }
}

/// Object key of the export for `entity`
pub fn csv_key(entity: TargetEntity) -> String {
    format!("{}.csv", entity.table_name())
}

#[derive(Debug, Clone, Serialize)]
pub struct TableMigration {
    pub table: TargetEntity,
    pub inserted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    pub tables: Vec<TableMigration>,
    /// Set when rejected lines were uploaded
    pub failed_records_key: Option<String>,
}

/// Load every export into the database.
///
/// Nothing is persisted unless all three tables load. Rejected lines seen
/// before a failure are still uploaded.
#[tracing::instrument(skip_all, fields(bucket = %storage.bucket()))]
pub async fn migrate(pool: &PgPool, storage: &Storage) -> Result<MigrationSummary, MigrationError> {
    info!("Starting data migration");

    let mut rejected = Vec::new();
    let result = load_all(pool, storage, &mut rejected).await;

    let uploaded = match upload_rejected(storage, &rejected).await {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Failed to upload failed records log");
            None
        },
    };

    match result {
        Ok(tables) => {
            info!(rejected = rejected.len(), "Migration completed");
            Ok(MigrationSummary {
                tables,
                failed_records_key: uploaded,
            })
        },
        Err(e) => {
            error!(error = %e, "Migration failed, nothing was committed");
            Err(e)
        },
    }
}

async fn load_all(
    pool: &PgPool,
    storage: &Storage,
    rejected: &mut Vec<RejectedLine>,
) -> Result<Vec<TableMigration>, MigrationError> {
    let mut tx = pool.begin().await?;
    let mut tables = Vec::with_capacity(TargetEntity::ALL.len());

    // Dependency order: hires reference departments and jobs
    for entity in TargetEntity::ALL {
        tables.push(load_table(&mut tx, storage, entity, rejected).await?);
    }

    tx.commit().await?;
    Ok(tables)
}

async fn load_table(
    tx: &mut Transaction<'_, Postgres>,
    storage: &Storage,
    entity: TargetEntity,
    rejected: &mut Vec<RejectedLine>,
) -> Result<TableMigration, MigrationError> {
    let key = csv_key(entity);
    info!(table = %entity, key = %key, "Migrating table");

    let data = storage.download(&key).await?;
    let parsed = parse_csv(entity, &data).map_err(|source| MigrationError::Csv {
        file: key.clone(),
        source,
    })?;

    if !parsed.rejected.is_empty() {
        warn!(
            table = %entity,
            rejected = parsed.rejected.len(),
            "Invalid rows found, logged to failed records"
        );
    }

    let rejected_count = parsed.rejected.len();
    rejected.extend(parsed.rejected);

    if parsed.rows.is_empty() {
        warn!(table = %entity, "No valid rows to insert");
    } else {
        parsed.rows.upsert(tx).await?;
        reset_sequence(tx, entity).await?;
        info!(table = %entity, inserted = parsed.rows.len(), "Inserted rows");
    }

    Ok(TableMigration {
        table: entity,
        inserted: parsed.rows.len(),
        rejected: rejected_count,
    })
}

async fn upload_rejected(
    storage: &Storage,
    rejected: &[RejectedLine],
) -> anyhow::Result<Option<String>> {
    if rejected.is_empty() {
        return Ok(None);
    }

    let body = render_failed_log(rejected);
    let upload = storage
        .upload(FAILED_RECORDS_KEY, body.into_bytes(), Some("text/plain"))
        .await?;
    Ok(Some(upload.key))
}

fn render_failed_log(rejected: &[RejectedLine]) -> String {
    let mut body = String::new();
    for line in rejected {
        body.push_str(&line.to_log_line());
        body.push('\n');
    }
    body
}

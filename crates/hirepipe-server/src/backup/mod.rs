//! Table snapshots to and from object storage
//!
//! Each table is written as one Avro container at `<table>_backup.avro` in
//! the backup bucket. Restores upsert by id and then move the table's id
//! sequence past the restored rows.

use futures::future::join_all;
use hirepipe_common::HirepipeError;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::{tables::reset_sequence, TableRows};
use crate::features::ingestion::TargetEntity;
use crate::storage::Storage;

pub mod codec;
pub mod scheduler;

pub use scheduler::BackupScheduler;

const AVRO_CONTENT_TYPE: &str = "application/avro";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    UnknownTable(#[from] HirepipeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No backup found at {0}")]
    NotFound(String),
}

impl From<anyhow::Error> for BackupError {
    fn from(err: anyhow::Error) -> Self {
        BackupError::Storage(format!("{err:#}"))
    }
}

/// Object key holding the snapshot of `entity`
pub fn backup_key(entity: TargetEntity) -> String {
    format!("{}_backup.avro", entity.table_name())
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedBackup {
    pub table: TargetEntity,
    pub key: String,
    pub rows: usize,
    pub size: i64,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedBackup {
    pub table: TargetEntity,
    pub error: String,
}

/// Result of backing up every table
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupSummary {
    pub uploaded: Vec<UploadedBackup>,
    /// Tables with no rows, nothing uploaded
    pub skipped: Vec<TargetEntity>,
    pub failed: Vec<FailedBackup>,
}

impl BackupSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, table: TargetEntity, result: Result<Option<UploadedBackup>, BackupError>) {
        match result {
            Ok(Some(uploaded)) => self.uploaded.push(uploaded),
            Ok(None) => self.skipped.push(table),
            Err(e) => self.failed.push(FailedBackup {
                table,
                error: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub table: TargetEntity,
    pub rows: usize,
    /// Next id the sequence will hand out, absent when nothing was restored
    pub next_id: Option<i64>,
}

/// Snapshot one table. Returns `None` when the table is empty.
#[tracing::instrument(skip(pool, storage))]
pub async fn backup_table(
    pool: &PgPool,
    storage: &Storage,
    entity: TargetEntity,
) -> Result<Option<UploadedBackup>, BackupError> {
    let rows = TableRows::fetch_all(pool, entity).await?;
    if rows.is_empty() {
        warn!(table = %entity, "No data found, skipping backup");
        return Ok(None);
    }

    let bytes = codec::encode(&rows)?;
    let key = backup_key(entity);
    let upload = storage.upload(&key, bytes, Some(AVRO_CONTENT_TYPE)).await?;

    info!(table = %entity, rows = rows.len(), key = %upload.key, "Backup uploaded");

    Ok(Some(UploadedBackup {
        table: entity,
        key: upload.key,
        rows: rows.len(),
        size: upload.size,
        checksum: upload.checksum,
    }))
}

/// Snapshot every table concurrently.
///
/// A failing table is logged and reported; the others still run.
pub async fn backup_all(pool: &PgPool, storage: &Storage) -> BackupSummary {
    info!("Starting full database backup");

    let results = join_all(
        TargetEntity::ALL
            .into_iter()
            .map(|entity| async move { (entity, backup_table(pool, storage, entity).await) }),
    )
    .await;

    let mut summary = BackupSummary::default();
    for (table, result) in results {
        if let Err(e) = &result {
            error!(table = %table, error = %e, "Backup failed");
        }
        summary.record(table, result);
    }

    info!(
        uploaded = summary.uploaded.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "Backup finished"
    );
    summary
}

/// Restore one table from its snapshot.
#[tracing::instrument(skip(pool, storage))]
pub async fn restore_table(
    pool: &PgPool,
    storage: &Storage,
    table: &str,
) -> Result<RestoreReport, BackupError> {
    let entity: TargetEntity = table.parse()?;
    let key = backup_key(entity);

    if !storage.exists(&key).await? {
        return Err(BackupError::NotFound(format!("s3://{}/{}", storage.bucket(), key)));
    }

    let bytes = storage.download(&key).await?;
    let rows = codec::decode(entity, &bytes)?;
    info!(table = %entity, rows = rows.len(), "Loaded backup");

    if rows.is_empty() {
        warn!(table = %entity, key = %key, "Backup holds no rows, skipping restore");
        return Ok(RestoreReport {
            table: entity,
            rows: 0,
            next_id: None,
        });
    }

    let mut tx = pool.begin().await?;
    rows.upsert(&mut tx).await?;
    let next_id = reset_sequence(&mut tx, entity).await?;
    tx.commit().await?;

    info!(table = %entity, rows = rows.len(), next_id, "Restore completed");

    Ok(RestoreReport {
        table: entity,
        rows: rows.len(),
        next_id: Some(next_id),
    })
}

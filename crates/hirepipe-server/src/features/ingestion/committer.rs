//! All-or-nothing insertion of a validated batch

use super::commands::IngestError;
use super::record::ValidatedRecord;
use super::schema::TargetEntity;
use super::store::IngestTransaction;

/// Insert `records` in order and commit.
///
/// Returns the store-assigned ids in input order. On any failure the
/// transaction is rolled back and nothing from the batch persists.
#[tracing::instrument(skip_all, fields(entity = %entity, attempted = records.len()))]
pub async fn commit_batch<T: IngestTransaction>(
    mut tx: T,
    entity: TargetEntity,
    records: &[ValidatedRecord],
) -> Result<Vec<i32>, IngestError> {
    let attempted = records.len();
    let mut ids = Vec::with_capacity(attempted);

    for record in records {
        match tx.insert_returning_id(record).await {
            Ok(id) => ids.push(id),
            Err(source) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed insert also failed");
                }
                return Err(IngestError::CommitFailure { entity, attempted, source });
            },
        }
    }

    tx.commit()
        .await
        .map_err(|source| IngestError::CommitFailure { entity, attempted, source })?;

    tracing::info!(ids = ?ids, "Committed batch");

    Ok(ids)
}

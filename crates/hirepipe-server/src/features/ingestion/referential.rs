//! Batched referential checks for hire events
//!
//! Distinct referenced ids are collected across the whole batch and looked up
//! with one membership query per reference kind, then every record is
//! classified locally.

use std::collections::{BTreeSet, HashSet};

use super::record::{Rejection, ValidatedRecord};
use super::schema::ReferenceKind;
use super::store::{IngestTransaction, StoreError};

/// Ids known to exist at the time of the lookup
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReferenceSet {
    departments: HashSet<i32>,
    jobs: HashSet<i32>,
}

impl ReferenceSet {
    /// Look up every id referenced by `records` inside the open transaction.
    pub async fn load<T: IngestTransaction>(
        tx: &mut T,
        records: &[(usize, ValidatedRecord)],
    ) -> Result<Self, StoreError> {
        let departments = lookup(tx, ReferenceKind::Department, records).await?;
        let jobs = lookup(tx, ReferenceKind::Job, records).await?;

        tracing::debug!(
            departments = departments.len(),
            jobs = jobs.len(),
            "Loaded referenced ids"
        );

        Ok(Self { departments, jobs })
    }

    fn known(&self, kind: ReferenceKind) -> &HashSet<i32> {
        match kind {
            ReferenceKind::Department => &self.departments,
            ReferenceKind::Job => &self.jobs,
        }
    }

    /// Rejects a record whose department or job is unknown.
    pub fn check(&self, record: &ValidatedRecord) -> Result<(), Rejection> {
        for kind in [ReferenceKind::Department, ReferenceKind::Job] {
            if let Some(id) = record.reference(kind) {
                if !self.known(kind).contains(&id) {
                    return Err(Rejection::MissingReference { kind, id });
                }
            }
        }
        Ok(())
    }
}

async fn lookup<T: IngestTransaction>(
    tx: &mut T,
    kind: ReferenceKind,
    records: &[(usize, ValidatedRecord)],
) -> Result<HashSet<i32>, StoreError> {
    let ids: Vec<i32> = records
        .iter()
        .filter_map(|(_, record)| record.reference(kind))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    tx.existing_ids(kind, &ids).await
}

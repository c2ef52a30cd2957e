//! Test helpers and fixtures
//!
//! [`MemoryStore`] is an in-memory [`IngestStore`] for exercising the pipeline
//! without Postgres. The `Test*` builders seed rows for database tests.
//!
//! # Examples
//!
//! ```rust,ignore
//! use hirepipe_server::features::shared::test_helpers::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_something(pool: PgPool) -> sqlx::Result<()> {
//!     let department = TestDepartment::new("Sales").insert(&pool).await?;
//!     let job = TestJob::new("Engineer").insert(&pool).await?;
//!     TestHire::new("Ann", department, job).at("2021-02-01T00:00:00Z").insert(&pool).await?;
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hirepipe_common::time::parse_iso8601;
use sqlx::PgPool;

use crate::features::ingestion::record::{HireEvent, ValidatedRecord};
use crate::features::ingestion::schema::{ReferenceKind, TargetEntity};
use crate::features::ingestion::store::{IngestStore, IngestTransaction, StoreError};

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    departments: BTreeMap<i32, String>,
    jobs: BTreeMap<i32, String>,
    hires: BTreeMap<i32, HireEvent>,
    sequences: BTreeMap<&'static str, i32>,
    lookups: Vec<(ReferenceKind, Vec<i32>)>,
    fail_begin: bool,
    fail_lookups: bool,
    fail_insert_at: Option<usize>,
    begins: usize,
    commits: usize,
    rollbacks: usize,
}

impl MemoryState {
    fn next_id(&mut self, entity: TargetEntity) -> i32 {
        let id = self.sequences.entry(entity.table_name()).or_insert(0);
        *id += 1;
        *id
    }

    fn apply(&mut self, id: i32, record: ValidatedRecord) {
        match record {
            ValidatedRecord::Department { department } => {
                self.departments.insert(id, department);
            },
            ValidatedRecord::Job { job } => {
                self.jobs.insert(id, job);
            },
            ValidatedRecord::HiredEmployee(event) => {
                self.hires.insert(id, event);
            },
        }
    }
}

/// In-memory [`IngestStore`] with failure injection
///
/// Ids come from per-table sequences that, like Postgres, are not reset by a
/// rollback. Writes become visible only on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_department(&self, name: &str) -> i32 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id(TargetEntity::Departments);
        state.departments.insert(id, name.to_string());
        id
    }

    pub fn seed_job(&self, name: &str) -> i32 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id(TargetEntity::Jobs);
        state.jobs.insert(id, name.to_string());
        id
    }

    pub fn fail_begin(&self) {
        self.state.lock().unwrap().fail_begin = true;
    }

    pub fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    /// Make the `index`-th insert (zero based) of each transaction fail.
    pub fn fail_insert_at(&self, index: usize) {
        self.state.lock().unwrap().fail_insert_at = Some(index);
    }

    pub fn department_names(&self) -> Vec<String> {
        self.state.lock().unwrap().departments.values().cloned().collect()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.state.lock().unwrap().jobs.values().cloned().collect()
    }

    pub fn hires(&self) -> Vec<(i32, HireEvent)> {
        let state = self.state.lock().unwrap();
        state.hires.iter().map(|(id, event)| (*id, event.clone())).collect()
    }

    pub fn lookups(&self) -> Vec<(ReferenceKind, Vec<i32>)> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn begins(&self) -> usize {
        self.state.lock().unwrap().begins
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }
}

#[async_trait]
impl IngestStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_begin {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        state.begins += 1;

        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
            inserts: 0,
        })
    }
}

/// Transaction handed out by [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    pending: Vec<(i32, ValidatedRecord)>,
    inserts: usize,
}

#[async_trait]
impl IngestTransaction for MemoryTransaction {
    async fn existing_ids(
        &mut self,
        kind: ReferenceKind,
        ids: &[i32],
    ) -> Result<HashSet<i32>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookup timed out".to_string()));
        }
        state.lookups.push((kind, ids.to_vec()));

        let table = match kind {
            ReferenceKind::Department => &state.departments,
            ReferenceKind::Job => &state.jobs,
        };
        Ok(ids.iter().copied().filter(|id| table.contains_key(id)).collect())
    }

    async fn insert_returning_id(&mut self, record: &ValidatedRecord) -> Result<i32, StoreError> {
        let mut state = self.state.lock().unwrap();
        let index = self.inserts;
        self.inserts += 1;

        if state.fail_insert_at == Some(index) {
            return Err(StoreError::Unavailable(format!("insert {index} failed")));
        }

        let id = state.next_id(record.entity());
        self.pending.push((id, record.clone()));
        Ok(id)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for (id, record) in self.pending {
            state.apply(id, record);
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

// ============================================================================
// Database fixtures
// ============================================================================

/// Builder for a department row
#[derive(Debug, Clone)]
pub struct TestDepartment {
    pub name: String,
}

impl TestDepartment {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    /// Insert the department and return its id
    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<i32> {
        sqlx::query_scalar("INSERT INTO departments (department) VALUES ($1) RETURNING id")
            .bind(self.name)
            .fetch_one(pool)
            .await
    }
}

/// Builder for a job row
#[derive(Debug, Clone)]
pub struct TestJob {
    pub name: String,
}

impl TestJob {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    /// Insert the job and return its id
    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<i32> {
        sqlx::query_scalar("INSERT INTO jobs (job) VALUES ($1) RETURNING id")
            .bind(self.name)
            .fetch_one(pool)
            .await
    }
}

/// Builder for a hired_employees row
#[derive(Debug, Clone)]
pub struct TestHire {
    pub name: String,
    pub hire_datetime: DateTime<Utc>,
    pub department_id: i32,
    pub job_id: i32,
}

impl TestHire {
    /// Hired at 2021-01-15T09:00:00Z unless [`TestHire::at`] says otherwise
    pub fn new(name: &str, department_id: i32, job_id: i32) -> Self {
        Self {
            name: name.to_string(),
            hire_datetime: parse_iso8601("2021-01-15T09:00:00Z").unwrap(),
            department_id,
            job_id,
        }
    }

    pub fn at(mut self, timestamp: &str) -> Self {
        self.hire_datetime = parse_iso8601(timestamp).unwrap();
        self
    }

    /// Insert the hire event and return its id
    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<i32> {
        sqlx::query_scalar(
            "INSERT INTO hired_employees (name, hire_datetime, department_id, job_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(self.name)
        .bind(self.hire_datetime)
        .bind(self.department_id)
        .bind(self.job_id)
        .fetch_one(pool)
        .await
    }
}

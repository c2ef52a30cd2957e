//! Whole-table reads and id-preserving writes
//!
//! Backup, restore and the CSV migration move complete rows, ids included.
//! Ingestion never goes through here; it lets the database assign ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::features::ingestion::TargetEntity;

/// Rows per multi-row `INSERT` statement.
pub const UPSERT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentRow {
    pub id: i32,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRow {
    pub id: i32,
    pub job: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HiredEmployeeRow {
    pub id: i32,
    pub name: String,
    /// Serialized as RFC 3339 with a `Z` designator
    #[serde(with = "iso8601")]
    pub hire_datetime: DateTime<Utc>,
    pub department_id: i32,
    pub job_id: i32,
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use hirepipe_common::time::{format_iso8601, parse_iso8601};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso8601(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_iso8601(&raw).map_err(serde::de::Error::custom)
    }
}

/// Every row of one table, ordered by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRows {
    Departments(Vec<DepartmentRow>),
    Jobs(Vec<JobRow>),
    HiredEmployees(Vec<HiredEmployeeRow>),
}

impl TableRows {
    pub fn empty(entity: TargetEntity) -> Self {
        match entity {
            TargetEntity::Departments => TableRows::Departments(Vec::new()),
            TargetEntity::Jobs => TableRows::Jobs(Vec::new()),
            TargetEntity::HiredEmployees => TableRows::HiredEmployees(Vec::new()),
        }
    }

    pub fn entity(&self) -> TargetEntity {
        match self {
            TableRows::Departments(_) => TargetEntity::Departments,
            TableRows::Jobs(_) => TargetEntity::Jobs,
            TableRows::HiredEmployees(_) => TargetEntity::HiredEmployees,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableRows::Departments(rows) => rows.len(),
            TableRows::Jobs(rows) => rows.len(),
            TableRows::HiredEmployees(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the whole table.
    #[tracing::instrument(skip(pool))]
    pub async fn fetch_all(pool: &PgPool, entity: TargetEntity) -> sqlx::Result<Self> {
        let rows = match entity {
            TargetEntity::Departments => TableRows::Departments(
                sqlx::query_as("SELECT id, department FROM departments ORDER BY id")
                    .fetch_all(pool)
                    .await?,
            ),
            TargetEntity::Jobs => TableRows::Jobs(
                sqlx::query_as("SELECT id, job FROM jobs ORDER BY id")
                    .fetch_all(pool)
                    .await?,
            ),
            TargetEntity::HiredEmployees => TableRows::HiredEmployees(
                sqlx::query_as(
                    "SELECT id, name, hire_datetime, department_id, job_id \
                     FROM hired_employees ORDER BY id",
                )
                .fetch_all(pool)
                .await?,
            ),
        };

        tracing::debug!(rows = rows.len(), "Fetched table");
        Ok(rows)
    }

    /// Insert or overwrite every row by id, in chunks.
    ///
    /// Returns the number of rows written.
    pub async fn upsert(&self, tx: &mut Transaction<'_, Postgres>) -> sqlx::Result<u64> {
        let mut written = 0;

        match self {
            TableRows::Departments(rows) => {
                for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
                    let mut query_builder: QueryBuilder<Postgres> =
                        QueryBuilder::new("INSERT INTO departments (id, department) ");
                    query_builder.push_values(chunk, |mut b, row| {
                        b.push_bind(row.id).push_bind(&row.department);
                    });
                    query_builder.push(
                        " ON CONFLICT (id) DO UPDATE SET department = EXCLUDED.department",
                    );
                    written += query_builder.build().execute(&mut **tx).await?.rows_affected();
                }
            },
            TableRows::Jobs(rows) => {
                for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
                    let mut query_builder: QueryBuilder<Postgres> =
                        QueryBuilder::new("INSERT INTO jobs (id, job) ");
                    query_builder.push_values(chunk, |mut b, row| {
                        b.push_bind(row.id).push_bind(&row.job);
                    });
                    query_builder.push(" ON CONFLICT (id) DO UPDATE SET job = EXCLUDED.job");
                    written += query_builder.build().execute(&mut **tx).await?.rows_affected();
                }
            },
            TableRows::HiredEmployees(rows) => {
                for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
                    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                        "INSERT INTO hired_employees (id, name, hire_datetime, department_id, job_id) ",
                    );
                    query_builder.push_values(chunk, |mut b, row| {
                        b.push_bind(row.id)
                            .push_bind(&row.name)
                            .push_bind(row.hire_datetime)
                            .push_bind(row.department_id)
                            .push_bind(row.job_id);
                    });
                    query_builder.push(
                        " ON CONFLICT (id) DO UPDATE SET \
                         name = EXCLUDED.name, \
                         hire_datetime = EXCLUDED.hire_datetime, \
                         department_id = EXCLUDED.department_id, \
                         job_id = EXCLUDED.job_id",
                    );
                    written += query_builder.build().execute(&mut **tx).await?.rows_affected();
                }
            },
        }

        Ok(written)
    }
}

/// Move the table's id sequence past its current maximum id.
///
/// Rows written with explicit ids do not advance the `SERIAL` sequence, so
/// later ingestions would otherwise collide with them.
pub async fn reset_sequence(
    tx: &mut Transaction<'_, Postgres>,
    entity: TargetEntity,
) -> sqlx::Result<i64> {
    let table = entity.table_name();
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    );

    let next: i64 = sqlx::query_scalar(&sql).fetch_one(&mut **tx).await?;
    tracing::debug!(table, next_id = next, "Reset id sequence");
    Ok(next)
}

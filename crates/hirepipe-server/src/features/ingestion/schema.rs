//! Target entities accepted by the ingestion pipeline
//!
//! The set of tables is closed. Each entity carries its required fields, its
//! table name and the static insert statement used by the committer.

use std::fmt;
use std::str::FromStr;

use hirepipe_common::HirepipeError;
use serde::{Deserialize, Serialize};

/// One of the three tables the service writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEntity {
    Departments,
    Jobs,
    HiredEmployees,
}

impl TargetEntity {
    /// All entities in foreign-key dependency order.
    pub const ALL: [TargetEntity; 3] = [
        TargetEntity::Departments,
        TargetEntity::Jobs,
        TargetEntity::HiredEmployees,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            TargetEntity::Departments => "departments",
            TargetEntity::Jobs => "jobs",
            TargetEntity::HiredEmployees => "hired_employees",
        }
    }

    /// Fields that must be present on every incoming record.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            TargetEntity::Departments => &["department"],
            TargetEntity::Jobs => &["job"],
            TargetEntity::HiredEmployees => &["name", "hire_datetime", "department_id", "job_id"],
        }
    }

    /// Insert statement binding exactly the required fields, in order.
    pub fn insert_sql(self) -> &'static str {
        match self {
            TargetEntity::Departments => "INSERT INTO departments (department) VALUES ($1) RETURNING id",
            TargetEntity::Jobs => "INSERT INTO jobs (job) VALUES ($1) RETURNING id",
            TargetEntity::HiredEmployees => {
                "INSERT INTO hired_employees (name, hire_datetime, department_id, job_id) \
                 VALUES ($1, $2, $3, $4) RETURNING id"
            },
        }
    }

    /// Whether records of this entity reference rows in other tables.
    pub fn has_references(self) -> bool {
        matches!(self, TargetEntity::HiredEmployees)
    }
}

impl fmt::Display for TargetEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for TargetEntity {
    type Err = HirepipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "departments" => Ok(TargetEntity::Departments),
            "jobs" => Ok(TargetEntity::Jobs),
            "hired_employees" => Ok(TargetEntity::HiredEmployees),
            other => Err(HirepipeError::UnknownTable(other.to_string())),
        }
    }
}

/// Tables a hire event points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Department,
    Job,
}

impl ReferenceKind {
    pub fn table_name(self) -> &'static str {
        match self {
            ReferenceKind::Department => "departments",
            ReferenceKind::Job => "jobs",
        }
    }

    /// Field on the hire event that holds the reference.
    pub fn field(self) -> &'static str {
        match self {
            ReferenceKind::Department => "department_id",
            ReferenceKind::Job => "job_id",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Department => f.write_str("department"),
            ReferenceKind::Job => f.write_str("job"),
        }
    }
}

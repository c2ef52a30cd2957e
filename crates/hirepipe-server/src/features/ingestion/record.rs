//! Record shapes before and after validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{value::RawValue, Map, Value};
use thiserror::Error;

use super::schema::{ReferenceKind, TargetEntity};

/// The fields of a submitted record, parsed for validation.
pub type RawRecord = Map<String, Value>;

/// One record of a request body.
///
/// Keeps the submitted JSON text next to its parsed fields. Serializing
/// writes the original text back unchanged, key order and number spelling
/// included.
#[derive(Debug, Clone)]
pub struct SubmittedRecord {
    text: Box<RawValue>,
    fields: RawRecord,
}

impl SubmittedRecord {
    /// Parse one JSON object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn fields(&self) -> &RawRecord {
        &self.fields
    }

    /// The JSON text exactly as submitted
    pub fn as_json(&self) -> &str {
        self.text.get()
    }
}

impl PartialEq for SubmittedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.as_json() == other.as_json()
    }
}

impl<'de> Deserialize<'de> for SubmittedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Box::<RawValue>::deserialize(deserializer)?;
        let fields = serde_json::from_str(text.get()).map_err(serde::de::Error::custom)?;
        Ok(Self { text, fields })
    }
}

impl Serialize for SubmittedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.text.serialize(serializer)
    }
}

/// A hire event with every field converted to its column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HireEvent {
    pub name: String,
    pub hire_datetime: DateTime<Utc>,
    pub department_id: i32,
    pub job_id: i32,
}

/// A record that passed structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedRecord {
    Department { department: String },
    Job { job: String },
    HiredEmployee(HireEvent),
}

impl ValidatedRecord {
    pub fn entity(&self) -> TargetEntity {
        match self {
            ValidatedRecord::Department { .. } => TargetEntity::Departments,
            ValidatedRecord::Job { .. } => TargetEntity::Jobs,
            ValidatedRecord::HiredEmployee(_) => TargetEntity::HiredEmployees,
        }
    }

    /// The id this record points at for the given reference kind, if any.
    pub fn reference(&self, kind: ReferenceKind) -> Option<i32> {
        match (self, kind) {
            (ValidatedRecord::HiredEmployee(event), ReferenceKind::Department) => {
                Some(event.department_id)
            },
            (ValidatedRecord::HiredEmployee(event), ReferenceKind::Job) => Some(event.job_id),
            _ => None,
        }
    }
}

/// Why a single record was left out of the batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("hire_datetime {0} is not an ISO-8601 timestamp")]
    InvalidTimestamp(String),

    #[error("{kind} {id} does not exist")]
    MissingReference { kind: ReferenceKind, id: i32 },
}

impl Rejection {
    /// Structural rejections are decided from the record alone.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Rejection::MissingReference { .. })
    }
}

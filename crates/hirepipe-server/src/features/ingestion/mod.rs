//! Validated, transactional bulk ingestion
//!
//! Records flow leaf-first through the pipeline:
//!
//! - [`schema`]: closed set of target tables and their required fields
//! - [`validator`]: presence, type conversion and timestamp parsing
//! - [`referential`]: batched existence checks for hire-event references
//! - [`committer`]: all-or-nothing insertion of the valid subset
//! - [`commands::ingest`]: composes the stages and reports rejections

pub mod commands;
pub mod committer;
pub mod postgres;
pub mod record;
pub mod referential;
pub mod routes;
pub mod schema;
pub mod store;
pub mod validator;

pub use commands::{IngestError, IngestRecordsCommand, IngestionOutcome};
pub use record::{HireEvent, RawRecord, Rejection, SubmittedRecord, ValidatedRecord};
pub use routes::ingestion_routes;
pub use schema::{ReferenceKind, TargetEntity};

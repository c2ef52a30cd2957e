pub mod ingest;

pub use ingest::{IngestError, IngestRecordsCommand, IngestionOutcome};

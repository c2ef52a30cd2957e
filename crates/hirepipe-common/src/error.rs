//! Error types shared across hirepipe crates

use thiserror::Error;

/// Result type alias for hirepipe operations
pub type Result<T> = std::result::Result<T, HirepipeError>;

/// Main error type for hirepipe
#[derive(Error, Debug)]
pub enum HirepipeError {
    #[error("Invalid timestamp '{0}': expected an ISO-8601 date-time")]
    InvalidTimestamp(String),

    #[error("Unknown table '{0}'. Must be one of: departments, jobs, hired_employees")]
    UnknownTable(String),
}

//! Reporting queries over hire events

pub mod departments_above_average;
pub mod hires_by_quarter;

pub use departments_above_average::{DepartmentHires, DepartmentsAboveAverageQuery};
pub use hires_by_quarter::{HiresByQuarterQuery, QuarterlyHires};

/// Year used when the caller does not pass one.
pub const DEFAULT_YEAR: i32 = 2021;

/// Earliest reportable year.
pub const MIN_YEAR: i32 = 1900;

/// Latest reportable year.
pub const MAX_YEAR: i32 = 2100;

/// Errors shared by the reporting queries
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Year must be between {MIN_YEAR} and {MAX_YEAR}, got {0}")]
    InvalidYear(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub(crate) fn default_year() -> i32 {
    DEFAULT_YEAR
}

pub(crate) fn validate_year(year: i32) -> Result<(), MetricsError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(MetricsError::InvalidYear(year));
    }
    Ok(())
}

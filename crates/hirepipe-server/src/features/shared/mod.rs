//! Shared utilities for feature modules
//!
//! - **test_helpers**: in-memory ingestion store and database fixtures (test-only)

#[cfg(test)]
pub mod test_helpers;

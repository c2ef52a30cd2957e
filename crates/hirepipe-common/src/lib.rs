//! Hirepipe Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the hirepipe workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`HirepipeError`] and the crate [`Result`] alias
//! - **Logging**: centralized `tracing` subscriber setup in [`logging`]
//! - **Time**: ISO-8601 parsing and formatting shared by ingestion, backup and
//!   migration in [`time`]
//!
//! # Example
//!
//! ```no_run
//! use hirepipe_common::time::parse_iso8601;
//!
//! fn main() -> hirepipe_common::Result<()> {
//!     let hired_at = parse_iso8601("2021-05-15T14:30:00Z")?;
//!     println!("hired at {}", hired_at);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod time;

// Re-export commonly used types
pub use error::{HirepipeError, Result};

//! hirepipe server library
//!
//! HTTP ingestion and reporting over three hiring tables: `departments`,
//! `jobs` and `hired_employees`.
//!
//! # Overview
//!
//! - **Ingestion** (`POST /api/v1/insert`): validates a batch, checks that
//!   hires reference existing departments and jobs, and commits the valid
//!   records in a single transaction. Rejected records are returned verbatim.
//! - **Metrics** (`GET /api/v1/metrics/...`): quarterly hiring counts and
//!   departments hiring above the mean.
//! - **Backup / restore**: Avro snapshots of each table in S3-compatible
//!   storage, optionally on a schedule.
//! - **Migration**: one-shot load of headerless CSV exports.
//!
//! # Example
//!
//! ```no_run
//! use hirepipe_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let app = api::create_router(api::AppState { db: pool }, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod migration;
pub mod storage;

pub use error::AppError;

//! Feature modules implementing the hirepipe API
//!
//! Each feature is a vertical slice with its own commands or queries and
//! routes.
//!
//! # Features
//!
//! - **ingestion**: validated, transactional bulk inserts into the three tables
//! - **metrics**: hiring reports over the ingested data
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions

pub mod ingestion;
pub mod metrics;
pub mod shared;

use axum::Router;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
}

/// Creates the API router with all feature routes mounted
///
/// - `/insert` - Bulk ingestion
/// - `/metrics` - Hiring reports
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/insert", ingestion::ingestion_routes().with_state(state.db.clone()))
        .nest("/metrics", metrics::metrics_routes().with_state(state.db))
}

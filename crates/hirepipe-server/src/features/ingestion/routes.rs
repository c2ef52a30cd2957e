//! Ingestion API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/insert` - Validate and insert a batch of records into one table

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use sqlx::PgPool;

use super::commands::{IngestError, IngestRecordsCommand};
use crate::api::response::ErrorResponse;

/// Creates the ingestion router
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/insert", ingestion_routes())
///     .with_state(pool);
/// ```
pub fn ingestion_routes() -> Router<PgPool> {
    Router::new().route("/", post(insert_records))
}

/// Insert a batch of records
///
/// # Endpoint
///
/// `POST /api/v1/insert`
///
/// # Request Body
///
/// ```json
/// {
///   "table": "hired_employees",
///   "data": [
///     {"name": "Ann", "hire_datetime": "2021-05-01T00:00:00Z", "department_id": 1, "job_id": 2}
///   ]
/// }
/// ```
///
/// # Response
///
/// - `200 OK` - `{"success": bool, "message": string, "failed_records": [object]}`
/// - `400 Bad Request` - Unknown table
/// - `500 Internal Server Error` - Store unavailable or commit failed
#[tracing::instrument(
    skip(pool, command),
    fields(table = %command.table, records = command.data.len())
)]
async fn insert_records(
    State(pool): State<PgPool>,
    Json(command): Json<IngestRecordsCommand>,
) -> Result<Response, IngestError> {
    let outcome = super::commands::ingest::handle(pool, command).await?;

    tracing::info!(
        success = outcome.success,
        rejected = outcome.failed_records.len(),
        "{}",
        outcome.message
    );

    Ok((StatusCode::OK, Json(outcome)).into_response())
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        match self {
            IngestError::UnknownEntity(_) => {
                let error = ErrorResponse::new("UNKNOWN_ENTITY", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            IngestError::StoreUnavailable { entity, ref source } => {
                tracing::error!(entity = %entity, error = ?source, "Ingestion store unavailable");
                let error = ErrorResponse::new("INGESTION_FAILED", self.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            IngestError::CommitFailure { entity, attempted, ref source } => {
                tracing::error!(
                    entity = %entity,
                    attempted,
                    error = ?source,
                    "Ingestion commit failed, batch rolled back"
                );
                let error = ErrorResponse::new("INGESTION_FAILED", self.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

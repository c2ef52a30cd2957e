//! Reporting API routes
//!
//! # Route Structure
//!
//! - `GET /api/v1/metrics/hired-employees-by-quarter?year=2021`
//! - `GET /api/v1/metrics/departments-above-average-hiring?year=2021`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use super::queries::{DepartmentsAboveAverageQuery, HiresByQuarterQuery, MetricsError};
use crate::api::response::{ApiResponse, ErrorResponse};

pub fn metrics_routes() -> Router<PgPool> {
    Router::new()
        .route("/hired-employees-by-quarter", get(hired_employees_by_quarter))
        .route("/departments-above-average-hiring", get(departments_above_average_hiring))
}

/// Hires per department and job in each quarter of the year
///
/// # Response
///
/// - `200 OK` - Rows ordered by department, then job
/// - `400 Bad Request` - Year out of range
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool))]
async fn hired_employees_by_quarter(
    State(pool): State<PgPool>,
    Query(query): Query<HiresByQuarterQuery>,
) -> Result<Response, MetricsError> {
    let rows = super::queries::hires_by_quarter::handle(pool, query).await?;
    Ok(ApiResponse::success(rows).into_response())
}

/// Departments whose hires in the year exceed the mean over departments
///
/// # Response
///
/// - `200 OK` - Rows ordered by hires, highest first
/// - `400 Bad Request` - Year out of range
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool))]
async fn departments_above_average_hiring(
    State(pool): State<PgPool>,
    Query(query): Query<DepartmentsAboveAverageQuery>,
) -> Result<Response, MetricsError> {
    let rows = super::queries::departments_above_average::handle(pool, query).await?;
    Ok(ApiResponse::success(rows).into_response())
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        match self {
            MetricsError::InvalidYear(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            MetricsError::Database(ref e) => {
                tracing::error!("Database error while computing metrics: {}", e);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{TestDepartment, TestHire, TestJob};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn create_test_router(pool: PgPool) -> Router {
        Router::new().nest("/metrics", metrics_routes()).with_state(pool)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_year_out_of_range() {
        let pool = PgPool::connect_lazy("postgresql://localhost/hirepipe_test").unwrap();
        let app = create_test_router(pool);

        let (status, body) = get_json(app, "/metrics/hired-employees-by-quarter?year=1850").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_numeric_year_is_rejected_by_extractor() {
        let pool = PgPool::connect_lazy("postgresql://localhost/hirepipe_test").unwrap();
        let app = create_test_router(pool);

        let (status, _) = get_json(app, "/metrics/departments-above-average-hiring?year=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_quarterly_endpoint(pool: PgPool) -> sqlx::Result<()> {
        let department = TestDepartment::new("Sales").insert(&pool).await?;
        let job = TestJob::new("Engineer").insert(&pool).await?;
        TestHire::new("Ann", department, job).at("2021-05-01T00:00:00Z").insert(&pool).await?;

        let (status, body) =
            get_json(create_test_router(pool), "/metrics/hired-employees-by-quarter").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["department"], "Sales");
        assert_eq!(body["data"][0]["q2"], 1);
        Ok(())
    }
}

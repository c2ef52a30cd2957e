//! Departments that hired more than the yearly average

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{default_year, validate_year, MetricsError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentsAboveAverageQuery {
    #[serde(default = "default_year")]
    pub year: i32,
}

impl Default for DepartmentsAboveAverageQuery {
    fn default() -> Self {
        Self { year: default_year() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentHires {
    pub id: i32,
    pub department: String,
    pub hired: i64,
}

/// The mean is taken over departments with at least one hire in the year.
const DEPARTMENTS_ABOVE_AVERAGE_SQL: &str = r#"
    WITH department_hiring AS (
        SELECT
            he.department_id AS id,
            d.department,
            COUNT(he.id) AS hired
        FROM hired_employees he
        JOIN departments d ON he.department_id = d.id
        WHERE EXTRACT(YEAR FROM he.hire_datetime AT TIME ZONE 'UTC')::int = $1
        GROUP BY he.department_id, d.department
    ),
    average_hiring AS (
        SELECT AVG(hired) AS avg_hires FROM department_hiring
    )
    SELECT dh.id, dh.department, dh.hired
    FROM department_hiring dh
    JOIN average_hiring ah ON dh.hired > ah.avg_hires
    ORDER BY dh.hired DESC, dh.department ASC
"#;

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: DepartmentsAboveAverageQuery,
) -> Result<Vec<DepartmentHires>, MetricsError> {
    validate_year(query.year)?;

    let rows = sqlx::query_as::<_, DepartmentHires>(DEPARTMENTS_ABOVE_AVERAGE_SQL)
        .bind(query.year)
        .fetch_all(&pool)
        .await?;

    tracing::info!(rows = rows.len(), "Fetched departments above average hiring");

    Ok(rows)
}

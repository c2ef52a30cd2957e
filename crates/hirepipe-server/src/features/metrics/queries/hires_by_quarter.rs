//! Hires per department and job, split by quarter

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{default_year, validate_year, MetricsError};

/// Query parameters for the quarterly breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiresByQuarterQuery {
    #[serde(default = "default_year")]
    pub year: i32,
}

impl Default for HiresByQuarterQuery {
    fn default() -> Self {
        Self { year: default_year() }
    }
}

/// Hire counts for one (department, job) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuarterlyHires {
    pub department: String,
    pub job: String,
    pub q1: i64,
    pub q2: i64,
    pub q3: i64,
    pub q4: i64,
}

impl QuarterlyHires {
    pub fn total(&self) -> i64 {
        self.q1 + self.q2 + self.q3 + self.q4
    }
}

const HIRES_BY_QUARTER_SQL: &str = r#"
    SELECT
        d.department AS department,
        j.job AS job,
        COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.hire_datetime AT TIME ZONE 'UTC') = 1) AS q1,
        COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.hire_datetime AT TIME ZONE 'UTC') = 2) AS q2,
        COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.hire_datetime AT TIME ZONE 'UTC') = 3) AS q3,
        COUNT(*) FILTER (WHERE EXTRACT(QUARTER FROM he.hire_datetime AT TIME ZONE 'UTC') = 4) AS q4
    FROM hired_employees he
    JOIN departments d ON he.department_id = d.id
    JOIN jobs j ON he.job_id = j.id
    WHERE EXTRACT(YEAR FROM he.hire_datetime AT TIME ZONE 'UTC')::int = $1
    GROUP BY d.department, j.job
    ORDER BY d.department ASC, j.job ASC
"#;

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: HiresByQuarterQuery,
) -> Result<Vec<QuarterlyHires>, MetricsError> {
    validate_year(query.year)?;

    let rows = sqlx::query_as::<_, QuarterlyHires>(HIRES_BY_QUARTER_SQL)
        .bind(query.year)
        .fetch_all(&pool)
        .await?;

    tracing::info!(rows = rows.len(), "Fetched hires by quarter");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{TestDepartment, TestHire, TestJob};

    #[test]
    fn test_year_defaults_when_absent() {
        let query: HiresByQuarterQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.year, 2021);
    }

    #[tokio::test]
    async fn test_invalid_year_is_rejected_before_querying() {
        let pool = PgPool::connect_lazy("postgresql://localhost/hirepipe_test").unwrap();
        let result = handle(pool, HiresByQuarterQuery { year: 3000 }).await;
        assert!(matches!(result, Err(MetricsError::InvalidYear(3000))));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_counts_per_quarter(pool: PgPool) -> sqlx::Result<()> {
        let sales = TestDepartment::new("Sales").insert(&pool).await?;
        let research = TestDepartment::new("Research").insert(&pool).await?;
        let engineer = TestJob::new("Engineer").insert(&pool).await?;
        let analyst = TestJob::new("Analyst").insert(&pool).await?;

        for at in ["2021-01-10T00:00:00Z", "2021-02-10T00:00:00Z", "2021-08-01T00:00:00Z"] {
            TestHire::new("s-e", sales, engineer).at(at).insert(&pool).await?;
        }
        TestHire::new("s-a", sales, analyst).at("2021-12-31T23:59:59Z").insert(&pool).await?;
        TestHire::new("r-e", research, engineer).at("2021-04-01T00:00:00Z").insert(&pool).await?;
        TestHire::new("old", research, engineer).at("2020-04-01T00:00:00Z").insert(&pool).await?;

        let rows = handle(pool, HiresByQuarterQuery::default()).await.unwrap();

        assert_eq!(
            rows,
            vec![
                QuarterlyHires {
                    department: "Research".to_string(),
                    job: "Engineer".to_string(),
                    q1: 0,
                    q2: 1,
                    q3: 0,
                    q4: 0,
                },
                QuarterlyHires {
                    department: "Sales".to_string(),
                    job: "Analyst".to_string(),
                    q1: 0,
                    q2: 0,
                    q3: 0,
                    q4: 1,
                },
                QuarterlyHires {
                    department: "Sales".to_string(),
                    job: "Engineer".to_string(),
                    q1: 2,
                    q2: 0,
                    q3: 1,
                    q4: 0,
                },
            ]
        );
        assert_eq!(rows.iter().map(QuarterlyHires::total).sum::<i64>(), 5);
        Ok(())
    }
}

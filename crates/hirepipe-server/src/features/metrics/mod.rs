pub mod queries;
pub mod routes;

pub use queries::{
    DepartmentHires, DepartmentsAboveAverageQuery, HiresByQuarterQuery, MetricsError,
    QuarterlyHires,
};

pub use routes::metrics_routes;

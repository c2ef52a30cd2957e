pub mod response;

use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::features;
use crate::middleware;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let feature_state = features::FeatureState {
        db: state.db.clone(),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", features::router(feature_state))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "hirepipe",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": [
            "POST /api/v1/insert",
            "GET /api/v1/metrics/hired-employees-by-quarter",
            "GET /api/v1/metrics/departments-above-average-hiring",
            "GET /health"
        ]
    }))
}

async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    db::health_check(&state.db).await?;
    Ok(Json(json!({
        "status": "healthy",
        "database": "connected"
    })))
}

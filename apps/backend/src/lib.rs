pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::services::grading::{
    grader_timeout_secs, GraderConfig, GradingAdapter, HttpGrader, KeywordGrader, TieredGrader,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub grader: Arc<dyn GradingAdapter>,
    pub grading_timeout: Duration,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let grader = build_grader()?;

    let state = AppState {
        db: Arc::new(db),
        grader,
        grading_timeout: Duration::from_secs(grader_timeout_secs()),
    };

    let app = router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the grader from the environment: an HTTP semantic grader
/// with keyword fallback when an endpoint is configured, the keyword
/// grader alone otherwise.
fn build_grader() -> anyhow::Result<Arc<dyn GradingAdapter>> {
    match GraderConfig::from_env() {
        Some(config) => {
            tracing::info!(endpoint = %config.endpoint, "Using HTTP grader with keyword fallback");
            let primary = Arc::new(HttpGrader::new(config)?);
            Ok(Arc::new(TieredGrader::new(
                primary,
                Arc::new(KeywordGrader),
            )))
        }
        None => {
            tracing::info!("GRADER_ENDPOINT not set, using keyword grader only");
            Ok(Arc::new(KeywordGrader))
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Question pipeline routes
        .route("/api/questions/review", post(routes::questions::review))
        .route("/api/questions", post(routes::questions::approve))
        .route(
            "/api/documents/{id}/questions",
            get(routes::questions::list_by_document),
        )
        // Exam session routes
        .route("/api/exams", post(routes::exams::create))
        .route("/api/exams/{id}", get(routes::exams::get_exam))
        .route("/api/exams/{id}/answers", put(routes::exams::save_answer))
        .route("/api/exams/{id}/submit", post(routes::exams::submit))
        .route("/api/exams/{id}/results", get(routes::exams::results))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

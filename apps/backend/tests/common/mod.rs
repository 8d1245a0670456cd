//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test data
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL
//! env var). Grading uses the local keyword grader, so no external
//! grading service is needed.

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use uuid::Uuid;

use examsim_backend::db::Database;
use examsim_backend::models::{DbQuestion, QuestionCandidate};
use examsim_backend::services::grading::KeywordGrader;
use examsim_backend::services::review;
use examsim_backend::{router, AppState};

/// Test context containing database connection and test server.
///
/// Use this to set up integration tests with a real database
/// connection. Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);

        let state = AppState {
            db: db.clone(),
            grader: Arc::new(KeywordGrader),
            grading_timeout: Duration::from_secs(5),
        };

        let app = router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Approve a candidate straight into the bank, bypassing HTTP.
    pub async fn approve_question(
        &self,
        document_id: Uuid,
        candidate: &QuestionCandidate,
    ) -> DbQuestion {
        review::approve_question(&self.db, document_id, candidate)
            .await
            .expect("Failed to approve test question")
    }

    /// Clean up test data for a document.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_document(&self, document_id: Uuid) {
        // Delete in order due to foreign keys
        let _ = sqlx::query(
            "DELETE FROM exam_results WHERE exam_id IN (SELECT id FROM exams WHERE document_id = $1)",
        )
        .bind(document_id)
        .execute(self.db.pool())
        .await;

        let _ = sqlx::query("DELETE FROM exams WHERE document_id = $1")
            .bind(document_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM questions WHERE document_id = $1")
            .bind(document_id)
            .execute(self.db.pool())
            .await;
    }
}

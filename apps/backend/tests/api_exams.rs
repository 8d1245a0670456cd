//! Integration tests for the exam session endpoints.
//!
//! These tests require a PostgreSQL database. Run with:
//! ```
//! DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use uuid::Uuid;

use examsim_backend::error::ApiError;
use examsim_backend::models::{ExamResponse, SubmitExamResponse};
use examsim_backend::services::session;

use common::fixtures;
use common::TestContext;

async fn seed_questions(ctx: &TestContext, document_id: Uuid, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for n in 1..=count {
        let question = ctx
            .approve_question(document_id, &fixtures::mcq_candidate(n))
            .await;
        ids.push(question.id);
    }
    ids
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_exam_fails_when_no_questions_exist() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            5,
            30,
        ))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_exam_clamps_count_to_available_questions() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 3).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            10,
            30,
        ))
        .await;

    response.assert_status_ok();
    let exam: ExamResponse = response.json();
    assert_eq!(exam.status, "in_progress");
    assert_eq!(exam.questions.len(), 3);
    // Learner view never carries answer fields
    let json = serde_json::to_string(&exam.questions).unwrap();
    assert!(!json.contains("correct_answer"));

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn exam_lifecycle_answer_and_submit() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 4).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            4,
            30,
        ))
        .await;
    response.assert_status_ok();
    let exam: ExamResponse = response.json();

    // Answer three of four: two correct, one wrong, one unanswered
    let answers = [("A", 20), ("A", 25), ("B", 15)];
    for (question, (answer, seconds)) in exam.questions.iter().zip(answers) {
        let response = server
            .put(&format!("/api/exams/{}/answers", exam.id))
            .json(&fixtures::save_answer_request(question.id, answer, seconds))
            .await;
        response.assert_status_ok();
    }

    let response = server
        .get(&format!("/api/exams/{}", exam.id))
        .await;
    response.assert_status_ok();
    let fetched: ExamResponse = response.json();
    assert_eq!(fetched.answers.len(), 3);
    assert_eq!(
        fetched.time_per_question[&exam.questions[0].id.to_string()],
        20
    );

    let response = server
        .post(&format!("/api/exams/{}/submit", exam.id))
        .await;
    response.assert_status_ok();
    let submitted: SubmitExamResponse = response.json();
    assert_eq!(submitted.status, "completed");
    assert_eq!(submitted.total_questions, 4);
    assert_eq!(submitted.correct_count, 2);
    assert_eq!(submitted.unanswered_count, 1);
    assert!((submitted.score - 50.0).abs() < f64::EPSILON);
    assert_eq!(submitted.results.len(), 4);

    let response = server
        .get(&format!("/api/exams/{}/results", exam.id))
        .await;
    response.assert_status_ok();
    let results: SubmitExamResponse = response.json();
    assert!((results.score - 50.0).abs() < f64::EPSILON);
    assert_eq!(results.results.len(), 4);

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn submit_is_idempotent() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 2).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            2,
            30,
        ))
        .await;
    let exam: ExamResponse = response.json();

    for question in &exam.questions {
        server
            .put(&format!("/api/exams/{}/answers", exam.id))
            .json(&fixtures::save_answer_request(question.id, "A", 10))
            .await
            .assert_status_ok();
    }

    let first: SubmitExamResponse = server
        .post(&format!("/api/exams/{}/submit", exam.id))
        .await
        .json();
    let second: SubmitExamResponse = server
        .post(&format!("/api/exams/{}/submit", exam.id))
        .await
        .json();

    // Re-submission returns the stored outcome, no re-grade and no
    // duplicate result rows
    assert_eq!(first.score, second.score);
    assert_eq!(first.correct_count, second.correct_count);
    assert_eq!(first.results.len(), 2);
    assert_eq!(second.results.len(), 2);

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn save_answer_rejected_after_submission() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 1).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            1,
            30,
        ))
        .await;
    let exam: ExamResponse = response.json();

    server
        .post(&format!("/api/exams/{}/submit", exam.id))
        .await
        .assert_status_ok();

    let response = server
        .put(&format!("/api/exams/{}/answers", exam.id))
        .json(&fixtures::save_answer_request(exam.questions[0].id, "A", 5))
        .await;
    response.assert_status_bad_request();

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn results_unavailable_before_submission() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 1).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            1,
            30,
        ))
        .await;
    let exam: ExamResponse = response.json();

    let response = server
        .get(&format!("/api/exams/{}/results", exam.id))
        .await;
    response.assert_status_bad_request();

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn expired_exam_is_force_completed_when_results_cannot_be_stored() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 1).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            1,
            30,
        ))
        .await;
    let exam: ExamResponse = response.json();

    // Push the session past its deadline.
    sqlx::query("UPDATE exams SET started_at = NOW() - INTERVAL '2 hours' WHERE id = $1")
        .bind(exam.id)
        .execute(ctx.db.pool())
        .await
        .unwrap();

    let stored = ctx.db.get_exam(exam.id).await.unwrap().unwrap();
    let outcome = session::resolve_persistence_failure(
        &ctx.db,
        &stored,
        ApiError::Internal("results could not be stored".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, "completed_with_error");
    assert_eq!(outcome.score, 0.0);
    assert_eq!(outcome.correct_count, 0);
    assert_eq!(outcome.unanswered_count, 0);
    assert!(outcome.results.is_empty());

    let completed = ctx.db.get_exam(exam.id).await.unwrap().unwrap();
    assert!(completed.completed_with_error);
    assert_eq!(completed.score, Some(0.0));

    // A later submit hands back the stored outcome unchanged.
    let resubmitted: SubmitExamResponse = server
        .post(&format!("/api/exams/{}/submit", exam.id))
        .await
        .json();
    assert_eq!(resubmitted.status, "completed_with_error");
    assert_eq!(resubmitted.score, 0.0);

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn persistence_failure_with_time_left_keeps_exam_in_progress() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let document_id = Uuid::new_v4();
    seed_questions(&ctx, document_id, 1).await;

    let response = server
        .post("/api/exams")
        .json(&fixtures::create_exam_request(
            Uuid::new_v4(),
            document_id,
            1,
            30,
        ))
        .await;
    let exam: ExamResponse = response.json();

    let stored = ctx.db.get_exam(exam.id).await.unwrap().unwrap();
    let outcome = session::resolve_persistence_failure(
        &ctx.db,
        &stored,
        ApiError::Internal("results could not be stored".to_string()),
    )
    .await;

    assert!(outcome.is_err());
    let still_open = ctx.db.get_exam(exam.id).await.unwrap().unwrap();
    assert!(still_open.completed_at.is_none());
    assert!(!still_open.completed_with_error);

    ctx.cleanup_document(document_id).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_exam_returns_not_found() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .get(&format!("/api/exams/{}", Uuid::new_v4()))
        .await;
    response.assert_status_not_found();
}

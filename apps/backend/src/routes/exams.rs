//! Exam session endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::session;
use crate::AppState;

/// POST /api/exams
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<Json<ExamResponse>> {
    let exam = session::create_exam(&state.db, &payload).await?;
    exam_response(&state, exam).await
}

/// GET /api/exams/{id}
pub async fn get_exam(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<ExamResponse>> {
    let exam = state
        .db
        .get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))?;
    exam_response(&state, exam).await
}

/// PUT /api/exams/{id}/answers
pub async fn save_answer(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<ExamResponse>> {
    let exam = session::save_answer(&state.db, exam_id, &payload).await?;
    exam_response(&state, exam).await
}

/// POST /api/exams/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<SubmitExamResponse>> {
    let response = session::submit(
        &state.db,
        state.grader.as_ref(),
        state.grading_timeout,
        exam_id,
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/exams/{id}/results
pub async fn results(
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<SubmitExamResponse>> {
    let exam = state
        .db
        .get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))?;

    if !exam.is_completed() {
        return Err(ApiError::BadRequest(
            "Exam is not completed yet".to_string(),
        ));
    }

    let response = session::stored_result(&state.db, &exam).await?;
    Ok(Json(response))
}

async fn exam_response(state: &AppState, exam: DbExam) -> Result<Json<ExamResponse>> {
    let questions = session::ordered_questions(&state.db, &exam).await?;
    let views = questions.iter().map(DbQuestion::to_exam_view).collect();
    Ok(Json(ExamResponse::from_db(&exam, views)))
}

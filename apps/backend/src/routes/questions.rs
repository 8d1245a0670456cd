//! Question review and approval endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::review;
use crate::AppState;

/// POST /api/questions/review
///
/// Validate a batch of candidates without persisting anything. The
/// caller sends either structured candidates or the raw model output
/// to be parsed server-side.
pub async fn review(
    State(state): State<AppState>,
    Json(payload): Json<ReviewCandidatesRequest>,
) -> Result<Json<ReviewCandidatesResponse>> {
    let candidates = match (&payload.candidates, &payload.raw_response) {
        (Some(candidates), _) => candidates.clone(),
        (None, Some(raw)) => exam_core::parse_candidates(raw, payload.question_type)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either candidates or raw_response is required".to_string(),
            ));
        }
    };

    let corpus = state.db.list_question_texts(payload.document_id).await?;
    let reports =
        review::review_candidates(&candidates, &corpus, payload.auto_fix.unwrap_or(true));

    Ok(Json(ReviewCandidatesResponse { reports }))
}

/// POST /api/questions
pub async fn approve(
    State(state): State<AppState>,
    Json(payload): Json<ApproveQuestionRequest>,
) -> Result<Json<DbQuestion>> {
    let question =
        review::approve_question(&state.db, payload.document_id, &payload.candidate).await?;
    Ok(Json(question))
}

/// GET /api/documents/{id}/questions
pub async fn list_by_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<Vec<DbQuestion>>> {
    let questions = state
        .db
        .list_approved(document_id, query.difficulty.map(|d| d.as_str()))
        .await?;
    Ok(Json(questions))
}

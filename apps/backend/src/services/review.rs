//! Candidate review and approval over the core validation pipeline.

use uuid::Uuid;

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::{DbQuestion, QuestionCandidate, ValidationReport};

/// Validate a batch of candidates against the existing corpus.
///
/// Candidates accepted earlier in the batch join the corpus, so two
/// near-identical candidates in one batch cannot both pass. Duplicate
/// matches fail validation here just as they do at approval.
pub fn review_candidates(
    candidates: &[QuestionCandidate],
    existing: &[String],
    auto_fix: bool,
) -> Vec<ValidationReport> {
    let mut corpus = existing.to_vec();

    candidates
        .iter()
        .map(|candidate| {
            let report = exam_core::validate(candidate, &corpus, auto_fix);
            if report.is_valid {
                corpus.push(report.normalized.question_text.clone());
            }
            report
        })
        .collect()
}

/// Re-validate and persist a single approved candidate.
///
/// Always runs with auto-fix so the bank only ever holds normalized
/// text. Any validation error rejects the approval.
pub async fn approve_question(
    db: &Database,
    document_id: Uuid,
    candidate: &QuestionCandidate,
) -> Result<DbQuestion> {
    let corpus = db.list_question_texts(document_id).await?;
    let report = exam_core::validate(candidate, &corpus, true);

    if !report.is_valid {
        return Err(ApiError::Validation(report.errors));
    }

    db.insert_question(document_id, &report.normalized).await
}

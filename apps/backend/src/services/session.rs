//! Exam session engine: creation, answer capture, scoring, and
//! completion.
//!
//! A session moves from in-progress to completed exactly once. The
//! completed_at compare-and-set in the database is the only guard
//! needed against double submission; scoring itself is a pure pass
//! over the stored answers.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::{
    CreateExamRequest, DbExam, DbExamResult, DbQuestion, QuestionType, SaveAnswerRequest,
    SubmitExamResponse,
};
use crate::services::grading::{GradeAttempt, GradingAdapter};
use exam_core::scoring::{is_choice_correct, is_true_false_correct, percentage};

/// Sampling seed from the user and the session start time: unique per
/// attempt, reproducible given the stored exam row.
pub fn derive_seed(user_id: Uuid, started_at: DateTime<Utc>) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(started_at.timestamp_micros().to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Sample `count` question ids without replacement using a local
/// seeded RNG. The sampled order becomes the fixed presentation
/// order. `count` larger than the pool is clamped to the pool size.
pub fn sample_question_ids(pool: &[i64], count: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = pool.to_vec();
    let count = count.min(ids.len());

    // Partial Fisher-Yates: only the first `count` positions matter.
    for i in 0..count {
        let j = rng.gen_range(i..ids.len());
        ids.swap(i, j);
    }
    ids.truncate(count);
    ids
}

/// Create an exam session from the approved question pool.
pub async fn create_exam(db: &Database, request: &CreateExamRequest) -> Result<DbExam> {
    if request.question_count == 0 {
        return Err(ApiError::BadRequest(
            "question_count must be at least 1".to_string(),
        ));
    }
    if request.duration_minutes <= 0 {
        return Err(ApiError::BadRequest(
            "duration_minutes must be positive".to_string(),
        ));
    }

    let pool = db
        .list_approved(
            request.document_id,
            request.difficulty.map(|d| d.as_str()),
        )
        .await?;
    if pool.is_empty() {
        return Err(ApiError::NoQuestionsAvailable);
    }

    let pool_ids: Vec<i64> = pool.iter().map(|q| q.id).collect();
    let started_at = Utc::now();
    let seed = derive_seed(request.user_id, started_at);
    let question_ids = sample_question_ids(&pool_ids, request.question_count, seed);

    tracing::info!(
        user_id = %request.user_id,
        document_id = %request.document_id,
        selected = question_ids.len(),
        pool = pool_ids.len(),
        "creating exam session"
    );

    db.create_exam(
        request.user_id,
        request.document_id,
        &question_ids,
        request.duration_minutes,
        started_at,
    )
    .await
}

/// Save one answer. Idempotent per question: a later save overwrites
/// the stored answer and elapsed time. The elapsed seconds are
/// client-reported and stored at face value.
pub async fn save_answer(
    db: &Database,
    exam_id: Uuid,
    request: &SaveAnswerRequest,
) -> Result<DbExam> {
    let exam = db
        .get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))?;

    if exam.is_completed() {
        return Err(ApiError::BadRequest(
            "Exam is already completed".to_string(),
        ));
    }
    if !exam.question_ids.0.contains(&request.question_id) {
        return Err(ApiError::BadRequest(
            "Question is not part of this exam".to_string(),
        ));
    }
    if request.time_spent_seconds < 0 {
        return Err(ApiError::BadRequest(
            "time_spent_seconds cannot be negative".to_string(),
        ));
    }

    let saved = db
        .save_answer(
            exam_id,
            request.question_id,
            &request.answer,
            request.time_spent_seconds,
        )
        .await?;
    if !saved {
        // Lost a race with a concurrent submit.
        return Err(ApiError::BadRequest(
            "Exam is already completed".to_string(),
        ));
    }

    db.get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))
}

/// Outcome of scoring an exam's answers.
#[derive(Debug)]
pub struct ScoreSummary {
    pub results: Vec<DbExamResult>,
    pub score: f64,
    pub correct_count: usize,
    pub unanswered_count: usize,
}

/// Score every selected question, in the original selection order.
///
/// Grading calls run sequentially, each under `grading_timeout`. A
/// timeout or unavailable grader marks that one item incorrect and
/// never aborts the rest of the submission.
pub async fn score_answers(
    grader: &dyn GradingAdapter,
    grading_timeout: Duration,
    exam: &DbExam,
    questions: &[DbQuestion],
) -> ScoreSummary {
    let mut results = Vec::with_capacity(questions.len());
    let mut correct_count = 0;
    let mut unanswered_count = 0;

    for question in questions {
        let answer = exam
            .answer_for(question.id)
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let is_correct = match answer {
            None => {
                unanswered_count += 1;
                false
            }
            Some(answer) => match question.question_type() {
                QuestionType::Mcq => question
                    .correct_answer
                    .as_deref()
                    .is_some_and(|correct| is_choice_correct(answer, correct)),
                QuestionType::TrueFalse => question
                    .correct_answer
                    .as_deref()
                    .is_some_and(|correct| is_true_false_correct(answer, correct)),
                QuestionType::ShortAnswer => {
                    grade_short_answer(grader, grading_timeout, question, answer).await
                }
            },
        };

        if is_correct {
            correct_count += 1;
        }

        results.push(DbExamResult {
            exam_id: exam.id,
            question_id: question.id,
            user_answer: answer.map(str::to_string),
            is_correct: Some(is_correct),
            // Client-reported; clamp rather than wrap on a bogus value.
            time_spent_seconds: exam.time_for(question.id).clamp(0, i64::from(i32::MAX)) as i32,
        });
    }

    ScoreSummary {
        score: percentage(correct_count, questions.len()),
        results,
        correct_count,
        unanswered_count,
    }
}

async fn grade_short_answer(
    grader: &dyn GradingAdapter,
    grading_timeout: Duration,
    question: &DbQuestion,
    answer: &str,
) -> bool {
    let model_answer = question.model_answer.as_deref().unwrap_or("");
    let key_points = question
        .key_points
        .as_ref()
        .map(|kp| kp.0.as_slice())
        .unwrap_or(&[]);

    let attempt = match tokio::time::timeout(
        grading_timeout,
        grader.grade(answer, model_answer, key_points),
    )
    .await
    {
        Ok(attempt) => attempt,
        Err(_) => GradeAttempt::Unavailable("grading timed out".to_string()),
    };

    match attempt {
        GradeAttempt::Graded(outcome) => outcome.is_correct,
        GradeAttempt::Unavailable(reason) => {
            tracing::warn!(
                question_id = question.id,
                %reason,
                "grading unavailable, marking answer incorrect"
            );
            false
        }
    }
}

/// Submit an exam. Idempotent: a completed exam returns its stored
/// result without re-scoring or writing new result rows.
pub async fn submit(
    db: &Database,
    grader: &dyn GradingAdapter,
    grading_timeout: Duration,
    exam_id: Uuid,
) -> Result<SubmitExamResponse> {
    let exam = db
        .get_exam(exam_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))?;

    if exam.is_completed() {
        return stored_result(db, &exam).await;
    }

    let questions = ordered_questions(db, &exam).await?;
    let summary = score_answers(grader, grading_timeout, &exam, &questions).await;

    let persisted = persist_submission(db, exam_id, &summary).await;
    match persisted {
        Ok(true) => Ok(SubmitExamResponse {
            exam_id,
            status: "completed".to_string(),
            score: summary.score,
            correct_count: summary.correct_count,
            unanswered_count: summary.unanswered_count,
            total_questions: questions.len(),
            results: summary.results,
        }),
        Ok(false) => {
            // Another submit won the race; hand back its result.
            let exam = db
                .get_exam(exam_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id}")))?;
            stored_result(db, &exam).await
        }
        Err(err) => resolve_persistence_failure(db, &exam, err).await,
    }
}

/// Resolve a submission whose results could not be stored.
///
/// With time still on the clock the error is returned and the exam
/// stays in progress for a retry. Once the deadline has passed the
/// exam is force-completed with score 0 and the error flag set, so
/// the learner is not trapped in a resubmission loop. The counts are
/// all zero: nothing was persisted.
pub async fn resolve_persistence_failure(
    db: &Database,
    exam: &DbExam,
    err: ApiError,
) -> Result<SubmitExamResponse> {
    if !exam.is_expired(Utc::now()) {
        return Err(err);
    }

    tracing::error!(
        exam_id = %exam.id,
        error = %err,
        "submission persistence failed after time expiry, forcing completion"
    );
    db.force_complete_with_error(exam.id).await?;

    Ok(SubmitExamResponse {
        exam_id: exam.id,
        status: "completed_with_error".to_string(),
        score: 0.0,
        correct_count: 0,
        unanswered_count: 0,
        total_questions: exam.question_ids.0.len(),
        results: Vec::new(),
    })
}

async fn persist_submission(
    db: &Database,
    exam_id: Uuid,
    summary: &ScoreSummary,
) -> Result<bool> {
    db.insert_exam_results(&summary.results).await?;
    db.try_complete(exam_id, summary.score).await
}

/// Build the response for an already-completed exam from stored rows.
pub async fn stored_result(db: &Database, exam: &DbExam) -> Result<SubmitExamResponse> {
    let results = db.get_exam_results(exam.id).await?;
    let correct_count = results
        .iter()
        .filter(|r| r.is_correct == Some(true))
        .count();
    let unanswered_count = results.iter().filter(|r| r.user_answer.is_none()).count();

    Ok(SubmitExamResponse {
        exam_id: exam.id,
        status: exam.status().to_string(),
        score: exam.score.unwrap_or(0.0),
        correct_count,
        unanswered_count,
        total_questions: exam.question_ids.0.len(),
        results,
    })
}

/// Fetch the exam's questions in presentation order.
pub async fn ordered_questions(db: &Database, exam: &DbExam) -> Result<Vec<DbQuestion>> {
    let fetched = db.get_questions_by_ids(&exam.question_ids.0).await?;
    let mut by_id: HashMap<i64, DbQuestion> =
        fetched.into_iter().map(|q| (q.id, q)).collect();

    exam.question_ids
        .0
        .iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or_else(|| ApiError::Internal(format!("Question {id} missing for exam")))
        })
        .collect()
}

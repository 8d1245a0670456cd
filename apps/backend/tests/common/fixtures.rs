//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use examsim_backend::models::{QuestionCandidate, QuestionType};

/// Question texts dissimilar enough that a batch of them passes the
/// near-duplicate check.
const QUESTION_TEXTS: [&str; 6] = [
    "Which gas do plants absorb during photosynthesis?",
    "What is the largest planet in the solar system?",
    "Who wrote the play Romeo and Juliet?",
    "Which organ pumps blood through the human body?",
    "What metal is liquid at room temperature?",
    "Which country hosted the first modern Olympic games?",
];

/// MCQ candidate number `n` (1-based). The correct answer is always
/// option A.
pub fn mcq_candidate(n: usize) -> QuestionCandidate {
    let text = QUESTION_TEXTS[(n - 1) % QUESTION_TEXTS.len()];
    let options: BTreeMap<String, String> = [
        ("A", format!("Right choice {n}")),
        ("B", format!("Decoy one {n}")),
        ("C", format!("Decoy two {n}")),
        ("D", format!("Decoy three {n}")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    QuestionCandidate {
        options: Some(options),
        correct_answer: Some("A".to_string()),
        explanation: Some("Covered in the study material.".to_string()),
        ..QuestionCandidate::new(text, QuestionType::Mcq)
    }
}

/// Create a review request body from structured candidates.
pub fn review_request(
    document_id: Uuid,
    question_type: &str,
    candidates: &[QuestionCandidate],
) -> serde_json::Value {
    json!({
        "document_id": document_id,
        "question_type": question_type,
        "candidates": candidates,
    })
}

/// Create an approve request body.
pub fn approve_request(document_id: Uuid, candidate: &QuestionCandidate) -> serde_json::Value {
    json!({
        "document_id": document_id,
        "candidate": candidate,
    })
}

/// Create an exam creation request body.
pub fn create_exam_request(
    user_id: Uuid,
    document_id: Uuid,
    question_count: usize,
    duration_minutes: i32,
) -> serde_json::Value {
    json!({
        "user_id": user_id,
        "document_id": document_id,
        "question_count": question_count,
        "duration_minutes": duration_minutes,
    })
}

/// Create a save answer request body.
pub fn save_answer_request(
    question_id: i64,
    answer: &str,
    time_spent_seconds: i64,
) -> serde_json::Value {
    json!({
        "question_id": question_id,
        "answer": answer,
        "time_spent_seconds": time_spent_seconds,
    })
}

//! Database models and API types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

// Re-export shared types from exam-core
pub use exam_core::types::{
    Difficulty, QuestionCandidate, QuestionType, ValidatedQuestion, ValidationReport,
};

// === Database Entity Types ===

/// Approved question stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestion {
    pub id: i64,
    pub document_id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<Json<BTreeMap<String, String>>>,
    pub correct_answer: Option<String>,
    pub model_answer: Option<String>,
    pub key_points: Option<Json<Vec<String>>>,
    pub explanation: Option<String>,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

impl DbQuestion {
    /// Parse the stored type string, defaulting unknown values to
    /// short answer (graded most conservatively).
    pub fn question_type(&self) -> QuestionType {
        QuestionType::from_str(&self.question_type).unwrap_or(QuestionType::ShortAnswer)
    }

    /// Sanitized view for learners taking an exam: no correct answer,
    /// model answer, or explanation.
    pub fn to_exam_view(&self) -> ExamQuestionView {
        ExamQuestionView {
            id: self.id,
            question_text: self.question_text.clone(),
            question_type: self.question_type.clone(),
            options: self.options.as_ref().map(|o| o.0.clone()),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// Exam session record.
///
/// `answers` and `time_per_question` are JSONB maps keyed by the
/// stringified question id (JSON object keys are strings).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbExam {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub question_ids: Json<Vec<i64>>,
    pub answers: Json<BTreeMap<String, String>>,
    pub time_per_question: Json<BTreeMap<String, i64>>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub completed_with_error: bool,
}

impl DbExam {
    pub fn status(&self) -> &'static str {
        match (self.completed_at, self.completed_with_error) {
            (Some(_), true) => "completed_with_error",
            (Some(_), false) => "completed",
            (None, _) => "in_progress",
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Moment the configured duration runs out.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline()
    }

    pub fn answer_for(&self, question_id: i64) -> Option<&str> {
        self.answers.0.get(&question_id.to_string()).map(String::as_str)
    }

    pub fn time_for(&self, question_id: i64) -> i64 {
        self.time_per_question
            .0
            .get(&question_id.to_string())
            .copied()
            .unwrap_or(0)
    }
}

/// Per-question result row, written once at submission
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbExamResult {
    pub exam_id: Uuid,
    pub question_id: i64,
    pub user_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub time_spent_seconds: i32,
}

// === API Request/Response Types ===

/// POST /api/questions/review request
#[derive(Debug, Deserialize)]
pub struct ReviewCandidatesRequest {
    pub document_id: Uuid,
    pub question_type: QuestionType,
    /// Structured candidates, when the caller already parsed them.
    pub candidates: Option<Vec<QuestionCandidate>>,
    /// Raw model output, parsed server-side when given.
    pub raw_response: Option<String>,
    pub auto_fix: Option<bool>,
}

/// POST /api/questions/review response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewCandidatesResponse {
    pub reports: Vec<ValidationReport>,
}

/// POST /api/questions request
#[derive(Debug, Deserialize)]
pub struct ApproveQuestionRequest {
    pub document_id: Uuid,
    pub candidate: QuestionCandidate,
}

/// GET /api/documents/{id}/questions query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    pub difficulty: Option<Difficulty>,
}

/// POST /api/exams request
#[derive(Debug, Deserialize)]
pub struct CreateExamRequest {
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub difficulty: Option<Difficulty>,
    pub question_count: usize,
    pub duration_minutes: i32,
}

/// PUT /api/exams/{id}/answers request
#[derive(Debug, Deserialize)]
pub struct SaveAnswerRequest {
    pub question_id: i64,
    pub answer: String,
    pub time_spent_seconds: i64,
}

/// Question as shown to a learner during an exam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestionView {
    pub id: i64,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<BTreeMap<String, String>>,
    pub difficulty: String,
}

/// Exam session as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ExamResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub status: String,
    pub questions: Vec<ExamQuestionView>,
    pub answers: BTreeMap<String, String>,
    pub time_per_question: BTreeMap<String, i64>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
}

impl ExamResponse {
    /// Build from the stored exam plus its questions in presentation
    /// order.
    pub fn from_db(exam: &DbExam, questions: Vec<ExamQuestionView>) -> Self {
        Self {
            id: exam.id,
            user_id: exam.user_id,
            document_id: exam.document_id,
            status: exam.status().to_string(),
            questions,
            answers: exam.answers.0.clone(),
            time_per_question: exam.time_per_question.0.clone(),
            started_at: exam.started_at,
            duration_minutes: exam.duration_minutes,
            completed_at: exam.completed_at,
            score: exam.score,
        }
    }
}

/// POST /api/exams/{id}/submit response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamResponse {
    pub exam_id: Uuid,
    pub status: String,
    pub score: f64,
    pub correct_count: usize,
    pub unanswered_count: usize,
    pub total_questions: usize,
    pub results: Vec<DbExamResult>,
}

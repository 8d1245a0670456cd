//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Question Repository ===

    /// Insert an approved, validated question into the bank
    pub async fn insert_question(
        &self,
        document_id: Uuid,
        question: &ValidatedQuestion,
    ) -> Result<DbQuestion> {
        let inserted = sqlx::query_as::<_, DbQuestion>(
            r#"
            INSERT INTO questions (document_id, question_text, question_type, options,
                                  correct_answer, model_answer, key_points, explanation, difficulty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, document_id, question_text, question_type, options,
                      correct_answer, model_answer, key_points, explanation, difficulty, created_at
            "#,
        )
        .bind(document_id)
        .bind(&question.question_text)
        .bind(question.question_type.as_str())
        .bind(question.options.as_ref().map(Json))
        .bind(&question.correct_answer)
        .bind(&question.model_answer)
        .bind(question.key_points.as_ref().map(Json))
        .bind(&question.explanation)
        .bind(question.difficulty.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    /// Get question by ID
    pub async fn get_question(&self, question_id: i64) -> Result<Option<DbQuestion>> {
        let question = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, document_id, question_text, question_type, options,
                   correct_answer, model_answer, key_points, explanation, difficulty, created_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// Get questions by IDs (no ordering guarantee; callers reorder)
    pub async fn get_questions_by_ids(&self, question_ids: &[i64]) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, document_id, question_text, question_type, options,
                   correct_answer, model_answer, key_points, explanation, difficulty, created_at
            FROM questions
            WHERE id = ANY($1)
            "#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// List approved questions for a document, optionally filtered by
    /// difficulty
    pub async fn list_approved(
        &self,
        document_id: Uuid,
        difficulty: Option<&str>,
    ) -> Result<Vec<DbQuestion>> {
        let questions = match difficulty {
            Some(tier) => {
                sqlx::query_as::<_, DbQuestion>(
                    r#"
                    SELECT id, document_id, question_text, question_type, options,
                           correct_answer, model_answer, key_points, explanation, difficulty, created_at
                    FROM questions
                    WHERE document_id = $1 AND difficulty = $2
                    ORDER BY id
                    "#,
                )
                .bind(document_id)
                .bind(tier)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbQuestion>(
                    r#"
                    SELECT id, document_id, question_text, question_type, options,
                           correct_answer, model_answer, key_points, explanation, difficulty, created_at
                    FROM questions
                    WHERE document_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(document_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(questions)
    }

    /// Question texts for a document, the duplicate-detection corpus
    pub async fn list_question_texts(&self, document_id: Uuid) -> Result<Vec<String>> {
        let texts = sqlx::query_scalar::<_, String>(
            r#"
            SELECT question_text
            FROM questions
            WHERE document_id = $1
            ORDER BY id
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(texts)
    }

    // === Exam Repository ===

    /// Create an exam session with a fixed question order
    pub async fn create_exam(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        question_ids: &[i64],
        duration_minutes: i32,
        started_at: DateTime<Utc>,
    ) -> Result<DbExam> {
        let exam = sqlx::query_as::<_, DbExam>(
            r#"
            INSERT INTO exams (user_id, document_id, question_ids, duration_minutes, started_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, document_id, question_ids, answers, time_per_question,
                      started_at, duration_minutes, completed_at, score, completed_with_error
            "#,
        )
        .bind(user_id)
        .bind(document_id)
        .bind(Json(question_ids))
        .bind(duration_minutes)
        .bind(started_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(exam)
    }

    /// Get exam by ID
    pub async fn get_exam(&self, exam_id: Uuid) -> Result<Option<DbExam>> {
        let exam = sqlx::query_as::<_, DbExam>(
            r#"
            SELECT id, user_id, document_id, question_ids, answers, time_per_question,
                   started_at, duration_minutes, completed_at, score, completed_with_error
            FROM exams
            WHERE id = $1
            "#,
        )
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam)
    }

    /// Upsert one answer and its elapsed time, keyed by question id.
    ///
    /// A single statement so concurrent saves for different questions
    /// compose and saves for the same question are last-write-wins.
    /// Returns false when the exam is already completed (or missing).
    pub async fn save_answer(
        &self,
        exam_id: Uuid,
        question_id: i64,
        answer: &str,
        time_spent_seconds: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exams
            SET answers = jsonb_set(answers, ARRAY[$2]::text[], to_jsonb($3::text), true),
                time_per_question = jsonb_set(time_per_question, ARRAY[$2]::text[], to_jsonb($4::bigint), true)
            WHERE id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(exam_id)
        .bind(question_id.to_string())
        .bind(answer)
        .bind(time_spent_seconds)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Complete an exam exactly once (compare-and-set on
    /// completed_at). Returns true when this call won; false means
    /// another submit already completed the exam.
    pub async fn try_complete(&self, exam_id: Uuid, score: f64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exams
            SET completed_at = NOW(), score = $2
            WHERE id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(exam_id)
        .bind(score)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Force-complete a timed-out exam whose submission could not be
    /// persisted: score 0 and the error flag set. Same guard as
    /// try_complete.
    pub async fn force_complete_with_error(&self, exam_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exams
            SET completed_at = NOW(), score = 0, completed_with_error = TRUE
            WHERE id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(exam_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Exam Result Repository ===

    /// Insert per-question results. Conflicting rows are left alone
    /// so a lost submit race never duplicates or rewrites results.
    pub async fn insert_exam_results(&self, results: &[DbExamResult]) -> Result<usize> {
        let mut count = 0;
        for result in results {
            let outcome = sqlx::query(
                r#"
                INSERT INTO exam_results (exam_id, question_id, user_answer, is_correct, time_spent_seconds)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (exam_id, question_id) DO NOTHING
                "#,
            )
            .bind(result.exam_id)
            .bind(result.question_id)
            .bind(&result.user_answer)
            .bind(result.is_correct)
            .bind(result.time_spent_seconds)
            .execute(&self.pool)
            .await?;
            count += outcome.rows_affected() as usize;
        }
        Ok(count)
    }

    /// Get results for an exam
    pub async fn get_exam_results(&self, exam_id: Uuid) -> Result<Vec<DbExamResult>> {
        let results = sqlx::query_as::<_, DbExamResult>(
            r#"
            SELECT exam_id, question_id, user_answer, is_correct, time_spent_seconds
            FROM exam_results
            WHERE exam_id = $1
            ORDER BY id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

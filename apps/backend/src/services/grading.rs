//! Semantic grading adapters for short-answer questions.
//!
//! The primary grader is an external HTTP service. It fails closed:
//! any transport error, non-success status, or malformed body is
//! reported as `Unavailable`, never as a fabricated grade. A local
//! keyword-coverage grader serves as an explicit fallback tier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use exam_core::scoring::key_point_coverage;

/// Default per-call grading timeout in seconds.
pub const DEFAULT_GRADER_TIMEOUT_SECS: u64 = 20;

/// Key-point coverage at which the keyword grader counts an answer
/// as correct.
const KEYWORD_CORRECT_THRESHOLD: f64 = 0.5;

/// A successful grade for one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub is_correct: bool,
    /// Similarity score, 0 to 100.
    pub score: f64,
    pub feedback: String,
}

/// Outcome of asking a grader for a grade. Unavailability is data,
/// not a caught exception: callers decide what to do with it.
#[derive(Debug, Clone)]
pub enum GradeAttempt {
    Graded(GradeOutcome),
    Unavailable(String),
}

/// A grading backend for free-text answers.
#[async_trait]
pub trait GradingAdapter: Send + Sync {
    async fn grade(
        &self,
        user_answer: &str,
        model_answer: &str,
        key_points: &[String],
    ) -> GradeAttempt;
}

/// Configuration for the HTTP grader, constructed explicitly at
/// startup rather than read lazily at call time.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl GraderConfig {
    /// Read from the environment. Returns None when GRADER_ENDPOINT
    /// is unset, meaning only the local fallback grader is used.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("GRADER_ENDPOINT").ok()?;
        let api_key = std::env::var("GRADER_API_KEY").ok();
        let model =
            std::env::var("GRADER_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let timeout = Duration::from_secs(grader_timeout_secs());

        Some(Self {
            endpoint,
            api_key,
            model,
            timeout,
        })
    }
}

/// Per-call grading timeout from GRADER_TIMEOUT_SECS.
pub fn grader_timeout_secs() -> u64 {
    std::env::var("GRADER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_GRADER_TIMEOUT_SECS)
}

#[derive(Serialize)]
struct GradeRequest<'a> {
    user_answer: &'a str,
    model_answer: &'a str,
    key_points: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct GradeResponse {
    is_correct: bool,
    score: f64,
    feedback: Option<String>,
}

/// External AI-backed grader over HTTP.
pub struct HttpGrader {
    client: reqwest::Client,
    config: GraderConfig,
}

impl HttpGrader {
    pub fn new(config: GraderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl GradingAdapter for HttpGrader {
    async fn grade(
        &self,
        user_answer: &str,
        model_answer: &str,
        key_points: &[String],
    ) -> GradeAttempt {
        let body = GradeRequest {
            user_answer,
            model_answer,
            key_points,
            model: &self.config.model,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return GradeAttempt::Unavailable(format!("request failed: {err}")),
        };

        if !response.status().is_success() {
            return GradeAttempt::Unavailable(format!(
                "grader returned status {}",
                response.status()
            ));
        }

        match response.json::<GradeResponse>().await {
            Ok(grade) => GradeAttempt::Graded(GradeOutcome {
                is_correct: grade.is_correct,
                score: grade.score.clamp(0.0, 100.0),
                feedback: grade.feedback.unwrap_or_default(),
            }),
            Err(err) => GradeAttempt::Unavailable(format!("malformed grader response: {err}")),
        }
    }
}

/// Local fallback grader: fraction of key points covered by the
/// answer. Correct at half coverage or better.
#[derive(Debug, Default)]
pub struct KeywordGrader;

#[async_trait]
impl GradingAdapter for KeywordGrader {
    async fn grade(
        &self,
        user_answer: &str,
        _model_answer: &str,
        key_points: &[String],
    ) -> GradeAttempt {
        let coverage = key_point_coverage(user_answer, key_points);
        GradeAttempt::Graded(GradeOutcome {
            is_correct: coverage >= KEYWORD_CORRECT_THRESHOLD,
            score: coverage * 100.0,
            feedback: format!("Matched {:.0}% of key points", coverage * 100.0),
        })
    }
}

/// Two-tier grader: the fallback runs only when the primary reports
/// itself unavailable, never on a graded-incorrect outcome.
pub struct TieredGrader {
    primary: Arc<dyn GradingAdapter>,
    fallback: Arc<dyn GradingAdapter>,
}

impl TieredGrader {
    pub fn new(primary: Arc<dyn GradingAdapter>, fallback: Arc<dyn GradingAdapter>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl GradingAdapter for TieredGrader {
    async fn grade(
        &self,
        user_answer: &str,
        model_answer: &str,
        key_points: &[String],
    ) -> GradeAttempt {
        match self.primary.grade(user_answer, model_answer, key_points).await {
            GradeAttempt::Unavailable(reason) => {
                tracing::warn!(%reason, "primary grader unavailable, using fallback");
                self.fallback.grade(user_answer, model_answer, key_points).await
            }
            graded => graded,
        }
    }
}

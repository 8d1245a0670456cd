//! Core types for the question pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The four option labels every MCQ must carry.
pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mcq" => Some(Self::Mcq),
            "true_false" => Some(Self::TrueFalse),
            "short_answer" => Some(Self::ShortAnswer),
            _ => None,
        }
    }
}

/// Heuristic difficulty tier. Not a ground-truth label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl Difficulty {
    /// Get the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// An unvalidated question, fresh from AI generation or manual entry.
///
/// True/false answers are carried as the lowercase strings `"true"` /
/// `"false"`; the parser folds JSON booleans before building one of
/// these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCandidate {
    pub question_text: String,
    pub question_type: QuestionType,
    /// Option texts keyed by label, MCQ only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionCandidate {
    /// Create a bare candidate with only text and type set.
    pub fn new(question_text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            question_text: question_text.into(),
            question_type,
            options: None,
            correct_answer: None,
            model_answer: None,
            key_points: None,
            explanation: None,
        }
    }
}

/// A candidate that passed structural checks: normalized text and
/// options, plus a computed difficulty tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Always computed by the pipeline, never caller-supplied.
    pub difficulty: Difficulty,
}

/// Outcome of running a candidate through the validator.
///
/// `normalized` holds the best-effort cleaned record even when
/// validation failed, so a caller can re-render the offending form
/// with already-fixed text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub normalized: ValidatedQuestion,
}

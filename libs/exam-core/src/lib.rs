//! Core question pipeline shared by the backend.
//!
//! Provides:
//! - Text normalization for question and option formatting
//! - Near-duplicate detection against an existing question corpus
//! - Heuristic difficulty scoring (easy/medium/hard)
//! - Structural question validation with error accumulation
//! - Parsing of free-form AI generation output into candidates
//! - Pure scoring primitives (answer correctness, key-point coverage)
//!
//! Everything here is synchronous and side-effect free; persistence
//! and grading I/O live in the backend.

pub mod difficulty;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod scoring;
pub mod similarity;
pub mod types;
pub mod validator;

pub use difficulty::estimate;
pub use error::{ParseError, Result};
pub use normalize::{normalize_option, normalize_question};
pub use parser::parse_candidates;
pub use scoring::{is_choice_correct, is_true_false_correct, key_point_coverage, percentage};
pub use similarity::{
    average_pairwise_ratio, find_duplicate, is_duplicate, sequence_ratio, DUPLICATE_THRESHOLD,
};
pub use types::{
    Difficulty, QuestionCandidate, QuestionType, ValidatedQuestion, ValidationReport,
    OPTION_LABELS,
};
pub use validator::{validate, MAX_OPTION_LENGTH, MAX_QUESTION_LENGTH, MIN_QUESTION_LENGTH};

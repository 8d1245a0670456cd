//! Question validation pipeline.
//!
//! Runs a candidate through normalization, length and per-type
//! structural checks, duplicate detection against an existing corpus,
//! and difficulty scoring. Errors accumulate so the caller sees every
//! problem at once; the normalized record is returned even on failure
//! so a form can be re-rendered with already-cleaned text.

use crate::difficulty;
use crate::normalize::{normalize_option, normalize_question};
use crate::similarity::{find_duplicate, DUPLICATE_THRESHOLD};
use crate::types::{
    QuestionCandidate, QuestionType, ValidatedQuestion, ValidationReport, OPTION_LABELS,
};
use std::collections::BTreeMap;

/// Minimum question text length after normalization.
pub const MIN_QUESTION_LENGTH: usize = 20;
/// Maximum question text length after normalization.
pub const MAX_QUESTION_LENGTH: usize = 500;
/// Maximum length of a single MCQ option.
pub const MAX_OPTION_LENGTH: usize = 300;

/// Validate a candidate against structural rules and an existing
/// question corpus.
///
/// With `auto_fix` the question and option texts are normalized before
/// any check runs; without it the raw input is validated untouched
/// (bulk-import mode, where silent mutation is undesirable). The
/// duplicate check is a hard failure. Difficulty is always computed
/// and attached, pass or fail.
pub fn validate(
    candidate: &QuestionCandidate,
    existing_questions: &[String],
    auto_fix: bool,
) -> ValidationReport {
    let mut errors = Vec::new();

    let question_text = if auto_fix {
        normalize_question(&candidate.question_text)
    } else {
        candidate.question_text.clone()
    };

    let options = candidate.options.as_ref().map(|opts| {
        if auto_fix && candidate.question_type == QuestionType::Mcq {
            opts.iter()
                .map(|(key, value)| (key.clone(), normalize_option(value)))
                .collect()
        } else {
            opts.clone()
        }
    });

    check_length(&question_text, &mut errors);

    let correct_answer = match candidate.question_type {
        QuestionType::Mcq => {
            check_mcq_options(options.as_ref(), &mut errors);
            check_mcq_answer(candidate.correct_answer.as_deref(), options.as_ref(), &mut errors)
        }
        QuestionType::TrueFalse => {
            check_true_false_answer(candidate.correct_answer.as_deref(), &mut errors)
        }
        QuestionType::ShortAnswer => {
            if let Some(key_points) = &candidate.key_points {
                if key_points.iter().any(|kp| kp.trim().is_empty()) {
                    errors.push("Key points cannot contain empty entries".to_string());
                }
            }
            candidate.correct_answer.clone()
        }
    };

    if let Some(similar) = find_duplicate(&question_text, existing_questions, DUPLICATE_THRESHOLD) {
        let shown: String = similar.chars().take(100).collect();
        errors.push(format!(
            "Question is too similar to existing question: '{shown}...'"
        ));
    }

    let difficulty = difficulty::estimate(&question_text, options.as_ref());

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        normalized: ValidatedQuestion {
            question_text,
            question_type: candidate.question_type,
            options,
            correct_answer,
            model_answer: candidate.model_answer.clone(),
            key_points: candidate.key_points.clone(),
            explanation: candidate.explanation.clone(),
            difficulty,
        },
    }
}

fn check_length(question_text: &str, errors: &mut Vec<String>) {
    let trimmed = question_text.trim();
    if trimmed.is_empty() {
        errors.push("Question text cannot be empty".to_string());
        return;
    }

    let length = trimmed.chars().count();
    if length < MIN_QUESTION_LENGTH {
        errors.push(format!(
            "Question is too short (minimum {MIN_QUESTION_LENGTH} characters, got {length})"
        ));
    } else if length > MAX_QUESTION_LENGTH {
        errors.push(format!(
            "Question is too long (maximum {MAX_QUESTION_LENGTH} characters, got {length})"
        ));
    }
}

fn check_mcq_options(options: Option<&BTreeMap<String, String>>, errors: &mut Vec<String>) {
    let Some(options) = options.filter(|o| !o.is_empty()) else {
        errors.push("MCQ questions require options".to_string());
        return;
    };

    let missing: Vec<&str> = OPTION_LABELS
        .iter()
        .filter(|label| !options.contains_key(**label))
        .copied()
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing options: {}", missing.join(", ")));
    }

    for label in options.keys() {
        if !OPTION_LABELS.contains(&label.as_str()) {
            errors.push(format!("Unexpected option label '{label}'"));
        }
    }

    for (label, value) in options {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            errors.push(format!("Option {label} cannot be empty"));
        } else if trimmed.chars().count() > MAX_OPTION_LENGTH {
            errors.push(format!(
                "Option {label} is too long (maximum {MAX_OPTION_LENGTH} characters)"
            ));
        }
    }

    let mut seen = Vec::new();
    for value in options.values() {
        let folded = value.trim().to_lowercase();
        if folded.is_empty() {
            continue;
        }
        if seen.contains(&folded) {
            errors.push("Options contain duplicates".to_string());
            break;
        }
        seen.push(folded);
    }
}

/// Validate the MCQ correct answer, returning it unchanged when it is
/// a label present in the options.
fn check_mcq_answer(
    correct_answer: Option<&str>,
    options: Option<&BTreeMap<String, String>>,
    errors: &mut Vec<String>,
) -> Option<String> {
    let Some(answer) = correct_answer.map(str::trim).filter(|a| !a.is_empty()) else {
        errors.push("Correct answer cannot be empty".to_string());
        return None;
    };

    if !OPTION_LABELS.contains(&answer) {
        errors.push(format!("Invalid MCQ answer '{answer}'. Must be A, B, C, or D"));
        return Some(answer.to_string());
    }

    if let Some(options) = options {
        if !options.contains_key(answer) {
            errors.push(format!("Correct answer '{answer}' not found in options"));
        }
    }

    Some(answer.to_string())
}

/// Validate a true/false answer, returning the lowercase normalized
/// form on acceptance.
fn check_true_false_answer(
    correct_answer: Option<&str>,
    errors: &mut Vec<String>,
) -> Option<String> {
    let Some(answer) = correct_answer.map(str::trim).filter(|a| !a.is_empty()) else {
        errors.push("Correct answer cannot be empty".to_string());
        return None;
    };

    let folded = answer.to_lowercase();
    if folded == "true" || folded == "false" {
        Some(folded)
    } else {
        errors.push("Invalid True/False answer. Must be 'true' or 'false'".to_string());
        Some(answer.to_string())
    }
}

//! Parsing adapter for free-form AI generation output.
//!
//! Model responses are supposed to be a JSON array of question
//! objects but frequently arrive wrapped in prose or markdown code
//! fences. Recovery order: direct parse, fenced code blocks, first
//! balanced `[...]` span. Each recovered object is structurally
//! checked for its question type before it becomes a candidate;
//! content rules (length, duplicates) belong to the validator, not
//! here.

use crate::error::{ParseError, Result};
use crate::types::{QuestionCandidate, QuestionType, OPTION_LABELS};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse a raw model response into structurally sound candidates.
pub fn parse_candidates(raw: &str, question_type: QuestionType) -> Result<Vec<QuestionCandidate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let array = extract_json_array(trimmed).ok_or(ParseError::NoJsonFound)?;

    array
        .iter()
        .enumerate()
        .map(|(index, value)| build_candidate(index, value, question_type))
        .collect()
}

/// Recover a JSON array from the response text.
fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return Some(items);
    }

    for block in fenced_blocks(text) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(block.trim()) {
            return Some(items);
        }
    }

    let mut from = 0;
    while let Some(start) = text[from..].find('[').map(|i| from + i) {
        if let Some(end) = matching_bracket(text, start) {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(items);
            }
        }
        from = start + 1;
    }

    None
}

/// Contents of every ``` fenced block, language tag stripped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after_fence = &rest[start + 3..];
        // Skip the language tag line, if any.
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        match body.find("```") {
            Some(end) => {
                blocks.push(&body[..end]);
                rest = &body[end + 3..];
            }
            None => break,
        }
    }
    blocks
}

/// Index of the `]` closing the `[` at `start`, tracking JSON string
/// and escape state so brackets inside string values do not confuse
/// the depth count.
fn matching_bracket(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'[' if !in_string => depth += 1,
            b']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn require_string(index: usize, value: &Value, field: &str) -> Result<String> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(ParseError::candidate(index, format!("Missing required field: {field}")))
        }
        Some(_) => Err(ParseError::candidate(index, format!("Field {field} must be a string"))),
    }
}

fn optional_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn build_candidate(index: usize, value: &Value, question_type: QuestionType) -> Result<QuestionCandidate> {
    if !value.is_object() {
        return Err(ParseError::candidate(index, "not a JSON object"));
    }

    let question_text = require_string(index, value, "question")?;
    let explanation = optional_string(value, "explanation");

    match question_type {
        QuestionType::Mcq => {
            let Some(Value::Object(raw_options)) = value.get("options") else {
                return Err(ParseError::candidate(index, "Options must be an object"));
            };

            let mut options = BTreeMap::new();
            for label in OPTION_LABELS {
                match raw_options.get(label) {
                    Some(Value::String(text)) => {
                        options.insert(label.to_string(), text.clone());
                    }
                    _ => {
                        return Err(ParseError::candidate(index, format!("Missing option: {label}")));
                    }
                }
            }

            let correct_answer = require_string(index, value, "correct_answer")?;
            if !OPTION_LABELS.contains(&correct_answer.as_str()) {
                return Err(ParseError::candidate(
                    index,
                    format!("Invalid correct_answer: {correct_answer}"),
                ));
            }
            if explanation.is_none() {
                return Err(ParseError::candidate(index, "Missing required field: explanation"));
            }

            Ok(QuestionCandidate {
                options: Some(options),
                correct_answer: Some(correct_answer),
                explanation,
                ..QuestionCandidate::new(question_text, question_type)
            })
        }
        QuestionType::TrueFalse => {
            // The prompt asks for a JSON boolean; fold it to the
            // lowercase string form used everywhere downstream.
            let correct_answer = match value.get("correct_answer") {
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => "true".to_string(),
                Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => "false".to_string(),
                _ => {
                    return Err(ParseError::candidate(index, "correct_answer must be a boolean"));
                }
            };
            if explanation.is_none() {
                return Err(ParseError::candidate(index, "Missing required field: explanation"));
            }

            Ok(QuestionCandidate {
                correct_answer: Some(correct_answer),
                explanation,
                ..QuestionCandidate::new(question_text, question_type)
            })
        }
        QuestionType::ShortAnswer => {
            let model_answer = require_string(index, value, "model_answer")?;
            let Some(Value::Array(raw_points)) = value.get("key_points") else {
                return Err(ParseError::candidate(index, "key_points must be a list"));
            };

            let mut key_points = Vec::with_capacity(raw_points.len());
            for point in raw_points {
                match point {
                    Value::String(s) => key_points.push(s.clone()),
                    _ => {
                        return Err(ParseError::candidate(index, "key_points must be a list"));
                    }
                }
            }

            Ok(QuestionCandidate {
                model_answer: Some(model_answer),
                key_points: Some(key_points),
                explanation,
                ..QuestionCandidate::new(question_text, question_type)
            })
        }
    }
}

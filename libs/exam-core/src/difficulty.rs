//! Heuristic difficulty scoring.
//!
//! An additive integer score over question and option characteristics,
//! thresholded into easy/medium/hard. Deterministic: identical inputs
//! always produce the identical tier.

use crate::similarity::average_pairwise_ratio;
use crate::types::Difficulty;
use std::collections::BTreeMap;

/// Keywords that signal higher-order thinking.
const COMPLEXITY_KEYWORDS: [&str; 13] = [
    "analyze",
    "evaluate",
    "compare",
    "contrast",
    "explain why",
    "justify",
    "critique",
    "synthesize",
    "infer",
    "predict",
    "how would",
    "what if",
    "why do you think",
];

/// Keywords that signal simple recall.
const SIMPLE_KEYWORDS: [&str; 6] = ["what is", "who is", "when did", "where is", "define", "list"];

/// Estimate a difficulty tier from question text and (for MCQ) its
/// options.
///
/// Scoring: length buckets (+2 over 150 chars, +1 over 80), one
/// complexity keyword +1, one simple-recall keyword -1, option length
/// buckets (+2 over 100 avg chars, +1 over 50), and +2 when options
/// are hard to tell apart (average pairwise similarity over 0.6).
/// Total <= 0 is easy, 1-3 medium, 4+ hard.
pub fn estimate(question_text: &str, options: Option<&BTreeMap<String, String>>) -> Difficulty {
    let mut score: i32 = 0;

    let question_length = question_text.trim().chars().count();
    if question_length > 150 {
        score += 2;
    } else if question_length > 80 {
        score += 1;
    }

    let question_lower = question_text.to_lowercase();
    if COMPLEXITY_KEYWORDS.iter().any(|kw| question_lower.contains(kw)) {
        score += 1;
    }
    if SIMPLE_KEYWORDS.iter().any(|kw| question_lower.contains(kw)) {
        score -= 1;
    }

    if let Some(options) = options.filter(|o| !o.is_empty()) {
        let total_length: usize = options.values().map(|v| v.chars().count()).sum();
        let avg_length = total_length as f64 / options.len() as f64;
        if avg_length > 100.0 {
            score += 2;
        } else if avg_length > 50.0 {
            score += 1;
        }

        // Options that read almost alike make the question harder.
        let lowered: Vec<String> = options.values().map(|v| v.to_lowercase()).collect();
        if lowered.len() > 1 && average_pairwise_ratio(&lowered) > 0.6 {
            score += 2;
        }
    }

    if score <= 0 {
        Difficulty::Easy
    } else if score <= 3 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

//! Pure scoring primitives shared by the exam session engine.

use crate::similarity::sequence_ratio;

/// Ratio at which a key point counts as present in an answer sentence
/// even without a literal substring match.
const KEY_POINT_MATCH_RATIO: f64 = 0.7;

/// MCQ correctness: exact label match. Both sides are normalized
/// single-letter labels, so case matters.
pub fn is_choice_correct(submitted: &str, correct: &str) -> bool {
    submitted == correct
}

/// True/false correctness: submitted answer lowercased against the
/// stored lowercase string.
pub fn is_true_false_correct(submitted: &str, correct: &str) -> bool {
    submitted.trim().to_lowercase() == correct
}

/// Fraction of key points covered by a free-text answer, in [0.0, 1.0].
///
/// A key point is covered when its lowercased text appears in the
/// lowercased answer, or when it reads close enough to one of the
/// answer's sentences. Empty key point lists yield 0.0.
pub fn key_point_coverage(answer: &str, key_points: &[String]) -> f64 {
    let points: Vec<&String> = key_points.iter().filter(|kp| !kp.trim().is_empty()).collect();
    if points.is_empty() {
        return 0.0;
    }

    let answer_lower = answer.to_lowercase();
    let sentences: Vec<String> = answer_lower
        .split(['.', '?', '!'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let covered = points
        .iter()
        .filter(|kp| {
            let kp_lower = kp.trim().to_lowercase();
            answer_lower.contains(&kp_lower)
                || sentences
                    .iter()
                    .any(|sentence| sequence_ratio(&kp_lower, sentence) >= KEY_POINT_MATCH_RATIO)
        })
        .count();

    covered as f64 / points.len() as f64
}

/// Final exam score: `100 * correct / total`, unrounded. Empty exams
/// score 0.0.
pub fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * correct as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_match_is_case_sensitive() {
        assert!(is_choice_correct("A", "A"));
        assert!(!is_choice_correct("a", "A"));
        assert!(!is_choice_correct("B", "A"));
    }

    #[test]
    fn true_false_match_ignores_case_and_whitespace() {
        assert!(is_true_false_correct("True", "true"));
        assert!(is_true_false_correct(" FALSE ", "false"));
        assert!(!is_true_false_correct("yes", "true"));
    }

    #[test]
    fn coverage_counts_literal_matches() {
        let key_points = vec!["light".to_string(), "chemical energy".to_string()];
        let coverage =
            key_point_coverage("Plants turn light into chemical energy.", &key_points);
        assert_eq!(coverage, 1.0);
    }

    #[test]
    fn coverage_is_case_insensitive() {
        let key_points = vec!["Chlorophyll".to_string()];
        assert_eq!(key_point_coverage("chlorophyll absorbs light", &key_points), 1.0);
    }

    #[test]
    fn coverage_counts_near_matches_per_sentence() {
        let key_points = vec!["plants convert light energy".to_string()];
        let coverage = key_point_coverage("Plants convert light enery. They grow.", &key_points);
        assert_eq!(coverage, 1.0);
    }

    #[test]
    fn uncovered_points_lower_the_fraction() {
        let key_points = vec!["light".to_string(), "mitochondria".to_string()];
        assert_eq!(key_point_coverage("Light is absorbed by leaves.", &key_points), 0.5);
    }

    #[test]
    fn empty_key_points_yield_zero() {
        assert_eq!(key_point_coverage("anything", &[]), 0.0);
        assert_eq!(key_point_coverage("anything", &["  ".to_string()]), 0.0);
    }

    #[test]
    fn percentage_is_unrounded() {
        assert_eq!(percentage(7, 10), 70.0);
        assert_eq!(percentage(1, 3), 100.0 / 3.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(10, 10), 100.0);
    }
}

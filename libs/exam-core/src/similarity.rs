//! Near-duplicate detection for question text.
//!
//! Similarity is a matching-blocks ratio: recursively find the
//! longest common substring, split around it, and sum the matched
//! character counts. The ratio is `2 * matched / (len_a + len_b)`,
//! in [0.0, 1.0].

use std::collections::HashMap;

/// Ratio at or above which two questions count as duplicates.
pub const DUPLICATE_THRESHOLD: f64 = 0.85;

/// Longest common block between `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
/// Returns (start in a, start in b, length).
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let mut best_i = a_lo;
    let mut best_j = b_lo;
    let mut best_size = 0;

    // j2len[j] = length of the longest block ending at a[i], b[j].
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for i in a_lo..a_hi {
        let mut new_j2len: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_index.get(&a[i]) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let k = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_j2len.insert(j, k);
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        j2len = new_j2len;
    }

    (best_i, best_j, best_size)
}

fn matched_chars(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> usize {
    let (i, j, size) = longest_match(a, b_index, a_lo, a_hi, b_lo, b_hi);
    if size == 0 {
        return 0;
    }
    size + matched_chars(a, b_index, a_lo, i, b_lo, j)
        + matched_chars(a, b_index, i + size, a_hi, j + size, b_hi)
}

/// Character-sequence similarity ratio between two strings, in
/// [0.0, 1.0]. Two empty strings are identical (1.0).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }

    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &ch) in b_chars.iter().enumerate() {
        b_index.entry(ch).or_default().push(j);
    }

    let matched = matched_chars(&a_chars, &b_index, 0, a_chars.len(), 0, b_chars.len());
    2.0 * matched as f64 / total as f64
}

/// Find the first corpus entry similar enough to `candidate` to count
/// as a duplicate. Both sides are trimmed and lowercased before
/// comparison; the returned reference is the original corpus entry.
///
/// First match wins, in corpus order, not best match. An empty corpus
/// never matches.
pub fn find_duplicate<'a>(
    candidate: &str,
    corpus: &'a [String],
    threshold: f64,
) -> Option<&'a str> {
    let candidate_normalized = candidate.trim().to_lowercase();

    for existing in corpus {
        let existing_normalized = existing.trim().to_lowercase();
        if sequence_ratio(&candidate_normalized, &existing_normalized) >= threshold {
            return Some(existing.as_str());
        }
    }

    None
}

/// Duplicate check returning (is_duplicate, matched corpus text).
pub fn is_duplicate(candidate: &str, corpus: &[String], threshold: f64) -> (bool, Option<String>) {
    match find_duplicate(candidate, corpus, threshold) {
        Some(text) => (true, Some(text.to_string())),
        None => (false, None),
    }
}

/// Average similarity ratio over all unordered pairs of `texts`.
/// Fewer than two texts yields 0.0.
pub fn average_pairwise_ratio(texts: &[String]) -> f64 {
    let mut total = 0.0;
    let mut comparisons = 0;

    for i in 0..texts.len() {
        for j in (i + 1)..texts.len() {
            total += sequence_ratio(&texts[i], &texts[j]);
            comparisons += 1;
        }
    }

    if comparisons == 0 {
        return 0.0;
    }
    total / comparisons as f64
}

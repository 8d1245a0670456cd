//! Text cleanup for question and option text.
//!
//! Repairs the formatting defects AI generation and manual entry
//! commonly produce: whitespace runs, missing terminal punctuation,
//! lowercase leading characters, and bad spacing around punctuation.
//! `normalize_question` is idempotent: running it twice yields the
//! same string as running it once.

/// First words that mark a sentence as a question when it lacks
/// terminal punctuation.
const QUESTION_STARTERS: [&str; 15] = [
    "what", "when", "where", "who", "why", "how", "which", "is", "are", "do", "does", "can",
    "could", "would", "should",
];

/// Punctuation that must not be preceded by a space and must be
/// followed by exactly one.
fn is_clause_punct(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '.' | '?' | '!')
}

/// Single pass over the text: collapse whitespace runs to one space,
/// trim, drop spaces before punctuation, ensure one space after
/// punctuation (when followed by a word), and collapse repeated `.`
/// or `?` runs.
fn normalize_spacing(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }

        if is_clause_punct(ch) {
            // No space before punctuation.
            pending_space = false;
            // Collapse ".." and "??" runs.
            if (ch == '.' || ch == '?') && out.ends_with(ch) {
                continue;
            }
            out.push(ch);
        } else {
            if pending_space || out.chars().last().is_some_and(is_clause_punct) {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
    }

    out
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalize question text: fix spacing, ensure terminal punctuation
/// (`?` when the first word reads as a question, `.` otherwise), and
/// capitalize the first character.
///
/// Empty or whitespace-only input returns an empty string.
pub fn normalize_question(text: &str) -> String {
    let mut fixed = normalize_spacing(text);
    if fixed.is_empty() {
        return fixed;
    }

    if !fixed.ends_with(['.', '?', '!']) {
        let first_word = fixed
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();
        if QUESTION_STARTERS.contains(&first_word.as_str()) {
            fixed.push('?');
        } else {
            fixed.push('.');
        }
    }

    capitalize_first(&fixed)
}

/// Normalize option text: same spacing and capitalization rules as
/// questions, but trailing `.?!` is stripped since options are
/// phrases, not sentences.
pub fn normalize_option(text: &str) -> String {
    let mut fixed = normalize_spacing(text);
    while fixed.ends_with(['.', '?', '!']) {
        fixed.pop();
        fixed.truncate(fixed.trim_end().len());
    }
    capitalize_first(&fixed)
}

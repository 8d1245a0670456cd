//! Boundaries to the document store and AI question generation.
//!
//! Both collaborators are traits: the backend orchestrates them but
//! does not implement text extraction or prompt handling itself.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{QuestionCandidate, ValidationReport};
use crate::services::review::review_candidates;

/// Supplies the plain text a document was reduced to. How the text
/// was extracted (PDF, DOCX, ...) is not this system's concern.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get_content(&self, document_id: Uuid) -> anyhow::Result<String>;
}

/// Requested number of candidates per question type.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationCounts {
    pub mcq: usize,
    pub true_false: usize,
    pub short_answer: usize,
}

/// Candidates plus human-readable warnings from the generation step
/// (skipped malformed items, truncated input, and the like).
#[derive(Debug, Default)]
pub struct GeneratedBatch {
    pub candidates: Vec<QuestionCandidate>,
    pub warnings: Vec<String>,
}

/// AI layer producing question candidates from document text.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, text: &str, counts: &GenerationCounts)
        -> anyhow::Result<GeneratedBatch>;
}

/// Review output: one report per candidate, in generation order, plus
/// the generator's warnings.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub reports: Vec<ValidationReport>,
    pub warnings: Vec<String>,
}

/// Fetch a document, generate candidates, and validate each against
/// the approved corpus. Rejected candidates are reported, not
/// dropped: the whole batch continues.
pub async fn generate_and_review(
    source: &dyn DocumentSource,
    generator: &dyn QuestionGenerator,
    document_id: Uuid,
    counts: &GenerationCounts,
    existing: &[String],
    auto_fix: bool,
) -> anyhow::Result<ReviewOutcome> {
    let text = source.get_content(document_id).await?;
    let batch = generator.generate(&text, counts).await?;

    let reports = review_candidates(&batch.candidates, existing, auto_fix);

    Ok(ReviewOutcome {
        reports,
        warnings: batch.warnings,
    })
}

//! Coverage statistics
//!
//! Pure function of a section list. Each percentage is rounded to the
//! nearest integer and its denominator floors at 1, so empty inputs give 0.

use tutor_model::{CourseSection, CoverageStats};

/// Recompute coverage from a section list
#[must_use]
pub fn compute_coverage(sections: &[CourseSection]) -> CoverageStats {
    let total_sections = sections.len();
    let ingested = sections.iter().filter(|s| s.has_content()).count();

    let (mut total_cards, mut mastered) = (0usize, 0usize);
    let (mut total_questions, mut validated) = (0usize, 0usize);
    for section in sections {
        total_cards += section.flashcards.len();
        mastered += section.flashcards.iter().filter(|c| c.is_mastered()).count();
        total_questions += section.practice_questions.len();
        validated += section
            .practice_questions
            .iter()
            .filter(|q| q.is_validated())
            .count();
    }

    CoverageStats {
        ingested: percent(ingested, total_sections),
        retained: percent(mastered, total_cards),
        validated: percent(validated, total_questions),
    }
}

/// `round(100 * part / max(1, whole))`, halves rounded up
fn percent(part: usize, whole: usize) -> u8 {
    let whole = whole.max(1);
    let part = part.min(whole);
    // Integer form of round-half-up: floor((200 * part + whole) / (2 * whole))
    let value = (200 * part + whole) / (2 * whole);
    value as u8
}

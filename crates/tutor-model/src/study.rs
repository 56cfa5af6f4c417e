//! Flashcards, practice questions and answer verdicts

use crate::ids::{CardId, QuestionId};
use serde::{Deserialize, Serialize};

/// Flashcard mastery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryStatus {
    #[default]
    Learning,
    Mastered,
}

/// Flashcard difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Question/answer recall card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: CardId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub mastery_status: MasteryStatus,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Flashcard {
    /// New card in the `learning` state
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: CardId::new(),
            question: question.into(),
            answer: answer.into(),
            mastery_status: MasteryStatus::Learning,
            failure_count: 0,
            difficulty: Difficulty::Medium,
        }
    }

    /// Record one review outcome
    ///
    /// A successful recall masters the card; a miss sends it back to
    /// `learning` and counts the failure.
    pub fn record_review(&mut self, recalled: bool) {
        if recalled {
            self.mastery_status = MasteryStatus::Mastered;
        } else {
            self.mastery_status = MasteryStatus::Learning;
            self.failure_count = self.failure_count.saturating_add(1);
        }
    }

    /// Whether the card is mastered
    #[inline]
    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.mastery_status == MasteryStatus::Mastered
    }
}

/// Default difficulty level of generated practice questions
pub const DEFAULT_DIFFICULTY_LEVEL: u8 = 3;

/// Multiple-choice practice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub has_been_answered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_correct: Option<bool>,
    #[serde(default = "default_difficulty_level")]
    pub difficulty_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_insight: Option<DeepInsight>,
}

fn default_difficulty_level() -> u8 {
    DEFAULT_DIFFICULTY_LEVEL
}

impl PracticeQuestion {
    /// New unanswered question
    #[must_use]
    pub fn new(question: impl Into<String>, options: Vec<String>, correct_index: usize) -> Self {
        Self {
            id: QuestionId::new(),
            question: question.into(),
            options,
            correct_index,
            explanation: None,
            has_been_answered: false,
            was_correct: None,
            difficulty_level: DEFAULT_DIFFICULTY_LEVEL,
            deep_insight: None,
        }
    }

    /// Record the verdict for an answer
    ///
    /// Returns `false` and changes nothing if the question was already
    /// answered: an answer is final.
    pub fn record_answer(&mut self, insight: DeepInsight) -> bool {
        if self.has_been_answered {
            return false;
        }
        self.has_been_answered = true;
        self.was_correct = Some(insight.is_correct);
        self.deep_insight = Some(insight);
        true
    }

    /// Answered and correct
    #[inline]
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.has_been_answered && self.was_correct == Some(true)
    }
}

/// Structured verdict on one answered question
///
/// Missing fields deserialize to their defaults so a partial verdict from
/// the model is still usable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeepInsight {
    pub is_correct: bool,
    pub verdict: String,
    pub why_user_choice_is_correct_or_wrong: String,
    pub correct_answer_explanation: String,
    pub misconception_detected: String,
    pub concepts_to_review: Vec<String>,
    pub exam_tip: String,
}

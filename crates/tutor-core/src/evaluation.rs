//! Answer evaluation and flashcard review
//!
//! An answer is final: once a question is answered, or while its evaluation
//! is in flight, further answers are no-ops.

use crate::error::{EvaluationError, TutorError};
use crate::registry::InFlight;
use std::sync::Arc;
use tutor_ai::TutorCapability;
use tutor_model::{CardId, CourseSection, Flashcard, PracticeQuestion, QuestionId, WorkspaceId};
use tutor_store::WorkspaceStore;

/// Result of [`Evaluator::answer_question`]
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The verdict was recorded; the updated question
    Answered(PracticeQuestion),
    /// Already answered or being evaluated; nothing changed
    AlreadyAnswered,
}

/// Evaluates answers and records reviews
pub struct Evaluator {
    store: Arc<WorkspaceStore>,
    capability: Arc<dyn TutorCapability>,
    pending: InFlight<QuestionId>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    #[must_use]
    pub fn new(store: Arc<WorkspaceStore>, capability: Arc<dyn TutorCapability>) -> Self {
        Self {
            store,
            capability,
            pending: InFlight::new(),
        }
    }

    /// Evaluate one multiple-choice answer
    ///
    /// On success the answered flag, correctness and insight are stored in
    /// one mutation. On failure nothing is stored and the question can be
    /// answered again.
    pub async fn answer_question(
        &self,
        workspace: WorkspaceId,
        section_index: usize,
        question_id: QuestionId,
        chosen_index: usize,
    ) -> Result<AnswerOutcome, TutorError> {
        let ws = self
            .store
            .workspace(workspace)
            .ok_or(TutorError::WorkspaceNotFound(workspace))?;
        let section = section_at(ws.sections, section_index)?;
        let question = section
            .question(question_id)
            .cloned()
            .ok_or(TutorError::QuestionNotFound(question_id))?;

        if question.has_been_answered {
            return Ok(AnswerOutcome::AlreadyAnswered);
        }
        if chosen_index >= question.options.len() {
            return Err(TutorError::OptionOutOfRange {
                index: chosen_index,
                len: question.options.len(),
            });
        }
        let Some(_claim) = self.pending.try_claim(question_id) else {
            tracing::debug!(question = %question_id, "evaluation already in flight");
            return Ok(AnswerOutcome::AlreadyAnswered);
        };
        // Another caller may have finished between the first check and the claim.
        let answered = self
            .store
            .section(workspace, section_index)
            .and_then(|s| s.question(question_id).map(|q| q.has_been_answered))
            .ok_or(TutorError::QuestionNotFound(question_id))?;
        if answered {
            return Ok(AnswerOutcome::AlreadyAnswered);
        }

        let insight = self
            .capability
            .evaluate_response(&question, chosen_index, &section, &ws.attachment)
            .await
            .map_err(|source| {
                tracing::error!(question = %question_id, "evaluation failed: {}", source);
                EvaluationError {
                    question: question_id,
                    source,
                }
            })?;

        let mut recorded = None;
        self.store.update_section(workspace, section_index, |s| {
            if let Some(q) = s.question_mut(question_id) {
                if q.record_answer(insight) {
                    recorded = Some(q.clone());
                }
            }
        });
        Ok(match recorded {
            Some(q) => {
                tracing::info!(
                    question = %question_id,
                    correct = q.was_correct.unwrap_or(false),
                    "answer recorded"
                );
                AnswerOutcome::Answered(q)
            }
            None => AnswerOutcome::AlreadyAnswered,
        })
    }

    /// Record whether a flashcard was recalled
    pub fn review_flashcard(
        &self,
        workspace: WorkspaceId,
        section_index: usize,
        card_id: CardId,
        recalled: bool,
    ) -> Result<Flashcard, TutorError> {
        let mut reviewed = None;
        self.store
            .update_section(workspace, section_index, |s| {
                if let Some(card) = s.flashcard_mut(card_id) {
                    card.record_review(recalled);
                    reviewed = Some(card.clone());
                }
            })
            .ok_or_else(|| self.locate_error(workspace, section_index))?;
        reviewed.ok_or(TutorError::CardNotFound(card_id))
    }

    /// Questions answered incorrectly in a section
    pub fn review_queue(
        &self,
        workspace: WorkspaceId,
        section_index: usize,
    ) -> Result<Vec<PracticeQuestion>, TutorError> {
        let ws = self
            .store
            .workspace(workspace)
            .ok_or(TutorError::WorkspaceNotFound(workspace))?;
        let section = section_at(ws.sections, section_index)?;
        Ok(section.review_queue().cloned().collect())
    }

    fn locate_error(&self, workspace: WorkspaceId, index: usize) -> TutorError {
        match self.store.workspace(workspace) {
            Some(ws) => TutorError::SectionOutOfRange {
                index,
                len: ws.sections.len(),
            },
            None => TutorError::WorkspaceNotFound(workspace),
        }
    }
}

fn section_at(sections: Vec<CourseSection>, index: usize) -> Result<CourseSection, TutorError> {
    let len = sections.len();
    sections
        .into_iter()
        .nth(index)
        .ok_or(TutorError::SectionOutOfRange { index, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_ai::AiError;
    use tutor_model::MasteryStatus;
    use tutor_test_utils::{sample_workspace, Op, ScriptedCapability};

    fn seeded() -> (Arc<WorkspaceStore>, WorkspaceId, QuestionId, CardId) {
        let store = Arc::new(WorkspaceStore::in_memory());
        let mut ws = sample_workspace(1);
        ws.sections[0].practice_questions = vec![PracticeQuestion::new(
            "Which organelle makes ATP?",
            vec!["Ribosome".into(), "Mitochondrion".into()],
            1,
        )];
        ws.sections[0].flashcards = vec![Flashcard::new("Powerhouse?", "Mitochondria")];
        let id = ws.id();
        let qid = ws.sections[0].practice_questions[0].id;
        let cid = ws.sections[0].flashcards[0].id;
        store.add_workspace(ws);
        (store, id, qid, cid)
    }

    #[tokio::test]
    async fn answer_is_recorded_once() {
        let (store, id, qid, _) = seeded();
        let capability = Arc::new(ScriptedCapability::new());
        let evaluator = Evaluator::new(store.clone(), capability.clone());

        let outcome = evaluator.answer_question(id, 0, qid, 0).await.unwrap();
        let AnswerOutcome::Answered(q) = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(q.was_correct, Some(false));
        assert!(q.deep_insight.is_some());

        let again = evaluator.answer_question(id, 0, qid, 1).await.unwrap();
        assert_eq!(again, AnswerOutcome::AlreadyAnswered);
        assert_eq!(capability.calls(Op::Evaluate), 1);
        assert_eq!(store.section(id, 0).unwrap().review_queue().count(), 1);
    }

    #[tokio::test]
    async fn failed_evaluation_changes_nothing() {
        let (store, id, qid, _) = seeded();
        let capability = Arc::new(ScriptedCapability::new().failing(Op::Evaluate, AiError::Timeout));
        let evaluator = Evaluator::new(store.clone(), capability);

        let err = evaluator.answer_question(id, 0, qid, 1).await.unwrap_err();
        assert!(matches!(err, TutorError::Evaluation(_)));

        let q = store.section(id, 0).unwrap().practice_questions[0].clone();
        assert!(!q.has_been_answered);
        assert_eq!(q.was_correct, None);
    }

    #[tokio::test]
    async fn option_outside_range_is_rejected_before_calling() {
        let (store, id, qid, _) = seeded();
        let capability = Arc::new(ScriptedCapability::new());
        let evaluator = Evaluator::new(store, capability.clone());

        let err = evaluator.answer_question(id, 0, qid, 4).await.unwrap_err();
        assert!(matches!(err, TutorError::OptionOutOfRange { index: 4, len: 2 }));
        assert_eq!(capability.calls(Op::Evaluate), 0);
    }

    #[test]
    fn flashcard_review_drives_retained() {
        let (store, id, _, cid) = seeded();
        let evaluator = Evaluator::new(store.clone(), Arc::new(ScriptedCapability::new()));

        let card = evaluator.review_flashcard(id, 0, cid, false).unwrap();
        assert_eq!(card.failure_count, 1);
        assert_eq!(store.workspace(id).unwrap().coverage_stats.retained, 0);

        let card = evaluator.review_flashcard(id, 0, cid, true).unwrap();
        assert_eq!(card.mastery_status, MasteryStatus::Mastered);
        assert_eq!(store.workspace(id).unwrap().coverage_stats.retained, 100);

        let err = evaluator.review_flashcard(id, 0, CardId::new(), true).unwrap_err();
        assert!(matches!(err, TutorError::CardNotFound(_)));
        let err = evaluator.review_flashcard(id, 3, cid, true).unwrap_err();
        assert!(matches!(err, TutorError::SectionOutOfRange { index: 3, len: 1 }));
    }
}

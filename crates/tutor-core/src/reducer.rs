//! Stage result reducer
//!
//! Maps one capability result onto section fields. Generated records get
//! fresh ids and their default review state here, so the orchestrator only
//! sequences calls.

use crate::state_machine::Stage;
use tutor_ai::{CoreResult, LogicResult, RawQuestion, RawResource, RecallResult};
use tutor_model::{CourseSection, Flashcard, Formula, KeyTerm, PracticeQuestion, Resource};

/// Relevance score given to every suggested resource
pub const DEFAULT_RESOURCE_SCORE: f64 = 0.9;

/// Options used when the model omits them
pub const PLACEHOLDER_OPTIONS: [&str; 4] = ["A", "B", "C", "D"];

/// One stage's result
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Core(CoreResult),
    Logic(LogicResult),
    Recall(RecallResult),
    Resources(Vec<RawResource>),
}

impl StageOutput {
    /// Stage that produced this output
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::Core(_) => Stage::Core,
            StageOutput::Logic(_) => Stage::Logic,
            StageOutput::Recall(_) => Stage::Recall,
            StageOutput::Resources(_) => Stage::Resources,
        }
    }
}

/// Merge one stage result into `section` and clear that stage's flag
///
/// Overwrites only the fields the stage owns. Running the same stage twice
/// replaces its fields with the newer values.
#[must_use]
pub fn apply_stage(mut section: CourseSection, output: StageOutput) -> CourseSection {
    let stage = output.stage();
    match output {
        StageOutput::Core(core) => {
            section.detailed_summary = core.detailed_summary.unwrap_or_else(|| core.summary.clone());
            section.content = core.content;
            section.summary = core.summary;
            section.key_terms = core
                .definitions
                .into_iter()
                .map(|d| KeyTerm {
                    term: d.term,
                    definition: d.definition,
                })
                .collect();
            section.formulas = core
                .axioms
                .into_iter()
                .map(|a| Formula {
                    expression: a.expression,
                    label: a.label,
                })
                .collect();
        }
        StageOutput::Logic(logic) => {
            section.mindmap = logic.mindmap;
        }
        StageOutput::Recall(recall) => {
            section.flashcards = recall
                .flashcards
                .into_iter()
                .map(|c| Flashcard::new(c.question, c.answer))
                .collect();
            section.practice_questions = recall.questions.into_iter().map(to_question).collect();
        }
        StageOutput::Resources(resources) => {
            section.resources = resources
                .into_iter()
                .map(|r| Resource {
                    title: r.title,
                    url: r.url,
                    kind: r.kind,
                    description: r.description,
                    score: DEFAULT_RESOURCE_SCORE,
                })
                .collect();
        }
    }
    *stage.flag(&mut section.loading) = false;
    section
}

fn to_question(raw: RawQuestion) -> PracticeQuestion {
    let options = match raw.options {
        Some(options) if !options.is_empty() => options,
        _ => PLACEHOLDER_OPTIONS.iter().map(|o| (*o).to_string()).collect(),
    };
    let correct_index = if raw.correct_index < options.len() {
        raw.correct_index
    } else {
        tracing::warn!(
            index = raw.correct_index,
            options = options.len(),
            "keyed answer outside options, defaulting to the first"
        );
        0
    };
    let mut question = PracticeQuestion::new(raw.question, options, correct_index);
    question.explanation = raw.explanation.filter(|e| !e.is_empty());
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tutor_ai::{RawDefinition, RawFlashcard};
    use tutor_model::{MasteryStatus, SectionStatus, DEFAULT_DIFFICULTY_LEVEL};

    fn loading_section() -> CourseSection {
        let mut s = CourseSection::skeleton("Cells", SectionStatus::InProgress);
        s.loading.core = true;
        s.loading.logic = true;
        s
    }

    #[test]
    fn core_maps_vocabulary_and_clears_only_its_flag() {
        let out = StageOutput::Core(CoreResult {
            content: "body".into(),
            summary: "short".into(),
            detailed_summary: None,
            definitions: vec![RawDefinition {
                term: "Cell".into(),
                definition: "Unit of life".into(),
            }],
            axioms: vec![],
        });
        let s = apply_stage(loading_section(), out);

        assert_eq!(s.content, "body");
        assert_eq!(s.detailed_summary, "short");
        assert_eq!(
            s.key_terms,
            vec![KeyTerm {
                term: "Cell".into(),
                definition: "Unit of life".into()
            }]
        );
        assert!(!s.loading.core);
        assert!(s.loading.logic);
    }

    #[test]
    fn recall_assigns_ids_and_defaults() {
        let out = StageOutput::Recall(RecallResult {
            flashcards: vec![
                RawFlashcard {
                    question: "Q1".into(),
                    answer: "A1".into(),
                },
                RawFlashcard {
                    question: "Q2".into(),
                    answer: "A2".into(),
                },
            ],
            questions: vec![RawQuestion {
                question: "Pick".into(),
                options: None,
                correct_index: 2,
                explanation: Some(String::new()),
            }],
        });
        let s = apply_stage(loading_section(), out);

        assert_ne!(s.flashcards[0].id, s.flashcards[1].id);
        assert!(s
            .flashcards
            .iter()
            .all(|c| c.mastery_status == MasteryStatus::Learning && c.failure_count == 0));

        let q = &s.practice_questions[0];
        assert_eq!(q.options, vec!["A", "B", "C", "D"]);
        assert_eq!(q.correct_index, 2);
        assert_eq!(q.difficulty_level, DEFAULT_DIFFICULTY_LEVEL);
        assert!(!q.has_been_answered);
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn keyed_index_outside_options_falls_back() {
        let q = to_question(RawQuestion {
            question: "Pick".into(),
            options: Some(vec!["x".into(), "y".into()]),
            correct_index: 7,
            explanation: None,
        });
        assert_eq!(q.correct_index, 0);
    }

    #[test]
    fn resource_scores_are_overwritten() {
        let out = StageOutput::Resources(vec![RawResource {
            title: "T".into(),
            url: "https://t".into(),
            score: Some(0.1),
            ..RawResource::default()
        }]);
        let mut section = loading_section();
        section.loading.resources = true;
        let s = apply_stage(section, out);
        assert_eq!(s.resources[0].score, DEFAULT_RESOURCE_SCORE);
        assert!(!s.loading.resources);
    }

    #[test]
    fn rerun_replaces_previous_values() {
        let first = apply_stage(
            loading_section(),
            StageOutput::Logic(LogicResult {
                mindmap: "old".into(),
            }),
        );
        let second = apply_stage(
            first,
            StageOutput::Logic(LogicResult {
                mindmap: "new".into(),
            }),
        );
        assert_eq!(second.mindmap, "new");
    }
}

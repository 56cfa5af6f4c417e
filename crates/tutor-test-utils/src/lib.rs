//! Testing utilities for the tutor workspace
//!
//! Shared fixtures and a scripted [`TutorCapability`] with per-call failure
//! injection, call counting and an optional gate that holds a call open.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tutor_ai::{
    AiError, CoreResult, LogicResult, RawAxiom, RawDefinition, RawFlashcard, RawQuestion,
    RawResource, RawSection, RecallResult, TutorCapability,
};
use tutor_model::{
    Attachment, CourseSection, DeepInsight, PracticeQuestion, SectionStatus, Workspace,
};

/// Capability operations, for scripting and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Structure,
    Core,
    Logic,
    Recall,
    Resources,
    Evaluate,
}

pub fn sample_attachment() -> Attachment {
    Attachment::new(
        "Cell Biology.pdf",
        "application/pdf",
        b"%PDF-1.4 cells enzymes membranes".to_vec(),
    )
}

pub fn sample_raw_sections(n: usize) -> Vec<RawSection> {
    (0..n)
        .map(|i| RawSection {
            title: Some(format!("Unit {}", i + 1)),
            summary: Some(format!("Overview of unit {}", i + 1)),
            source_range: Some(format!("p. {}-{}", i * 4 + 1, i * 4 + 4)),
            dependencies: if i == 0 {
                Vec::new()
            } else {
                vec![format!("Unit {i}")]
            },
        })
        .collect()
}

pub fn sample_core() -> CoreResult {
    CoreResult {
        content: "## Cells\nThe cell is the basic unit of life.".into(),
        summary: "Cells are the unit of life.".into(),
        detailed_summary: None,
        definitions: vec![RawDefinition {
            term: "Organelle".into(),
            definition: "A specialized structure within a cell.".into(),
        }],
        axioms: vec![RawAxiom {
            expression: "SA:V = 6/L".into(),
            label: "Surface-to-volume ratio of a cube".into(),
        }],
    }
}

pub fn sample_logic() -> LogicResult {
    LogicResult {
        mindmap: "mindmap\n  root((Cells))\n    Organelles\n    Membranes".into(),
    }
}

pub fn sample_recall() -> RecallResult {
    RecallResult {
        flashcards: vec![
            RawFlashcard {
                question: "What is the powerhouse of the cell?".into(),
                answer: "Mitochondria".into(),
            },
            RawFlashcard {
                question: "What encloses the cell?".into(),
                answer: "The plasma membrane".into(),
            },
        ],
        questions: vec![
            RawQuestion {
                question: "Which organelle makes ATP?".into(),
                options: Some(vec![
                    "Ribosome".into(),
                    "Mitochondrion".into(),
                    "Golgi".into(),
                    "Lysosome".into(),
                ]),
                correct_index: 1,
                explanation: Some("Oxidative phosphorylation".into()),
            },
            RawQuestion {
                question: "Cells were first described by?".into(),
                options: None,
                correct_index: 0,
                explanation: None,
            },
        ],
    }
}

pub fn sample_resources() -> Vec<RawResource> {
    vec![RawResource {
        title: "Khan Academy: Cells".into(),
        url: "https://www.khanacademy.org/science/biology/structure-of-a-cell".into(),
        kind: Some("video".into()),
        description: Some("Intro lectures".into()),
        score: Some(0.3),
    }]
}

/// Workspace with `n` skeleton sections, the first in progress
pub fn sample_workspace(n: usize) -> Workspace {
    let sections = (0..n)
        .map(|i| {
            let status = if i == 0 {
                SectionStatus::InProgress
            } else {
                SectionStatus::Locked
            };
            CourseSection::skeleton(format!("Unit {}", i + 1), status)
                .with_summary(format!("Overview of unit {}", i + 1))
        })
        .collect();
    Workspace::new(sample_attachment(), sections)
}

/// Verdict that marks the choice correct when it matches the key
pub fn keyed_insight(question: &PracticeQuestion, chosen_index: usize) -> DeepInsight {
    let is_correct = chosen_index == question.correct_index;
    DeepInsight {
        is_correct,
        verdict: if is_correct { "Correct" } else { "Incorrect" }.into(),
        why_user_choice_is_correct_or_wrong: format!("Option {chosen_index} was chosen."),
        correct_answer_explanation: format!("Option {} is keyed.", question.correct_index),
        concepts_to_review: if is_correct {
            Vec::new()
        } else {
            vec!["Cell respiration".into()]
        },
        ..DeepInsight::default()
    }
}

/// Scripted capability with canned successes
///
/// Every operation returns its sample result unless a failure was scripted
/// for it. A gated operation waits for [`ScriptedCapability::release`]
/// before answering.
#[derive(Debug)]
pub struct ScriptedCapability {
    structure: Vec<RawSection>,
    failures: Mutex<HashMap<Op, AiError>>,
    calls: Mutex<HashMap<Op, usize>>,
    gates: Mutex<HashMap<Op, Arc<Notify>>>,
}

impl Default for ScriptedCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self {
            structure: sample_raw_sections(3),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// With a fixed structure extraction result
    #[must_use]
    pub fn with_structure(mut self, sections: Vec<RawSection>) -> Self {
        self.structure = sections;
        self
    }

    /// Make `op` fail with `error` until cleared
    #[must_use]
    pub fn failing(self, op: Op, error: AiError) -> Self {
        self.fail(op, error);
        self
    }

    /// Hold `op` open until released
    #[must_use]
    pub fn gated(self, op: Op) -> Self {
        self.gates.lock().insert(op, Arc::new(Notify::new()));
        self
    }

    pub fn fail(&self, op: Op, error: AiError) {
        self.failures.lock().insert(op, error);
    }

    pub fn clear_failure(&self, op: Op) {
        self.failures.lock().remove(&op);
    }

    /// Let one waiting (or the next) gated call of `op` proceed
    pub fn release(&self, op: Op) {
        if let Some(gate) = self.gates.lock().get(&op) {
            gate.notify_one();
        }
    }

    /// Remove the gate on `op` and let any waiter through
    pub fn open(&self, op: Op) {
        if let Some(gate) = self.gates.lock().remove(&op) {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    async fn enter(&self, op: Op) -> Result<(), AiError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        let gate = self.gates.lock().get(&op).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TutorCapability for ScriptedCapability {
    async fn extract_structure(&self, _attachment: &Attachment) -> Result<Vec<RawSection>, AiError> {
        self.enter(Op::Structure).await?;
        Ok(self.structure.clone())
    }

    async fn generate_core(
        &self,
        _section: &CourseSection,
        _attachment: &Attachment,
    ) -> Result<CoreResult, AiError> {
        self.enter(Op::Core).await?;
        Ok(sample_core())
    }

    async fn generate_logic(
        &self,
        _section: &CourseSection,
        _attachment: &Attachment,
    ) -> Result<LogicResult, AiError> {
        self.enter(Op::Logic).await?;
        Ok(sample_logic())
    }

    async fn generate_recall(
        &self,
        _section: &CourseSection,
        _attachment: &Attachment,
    ) -> Result<RecallResult, AiError> {
        self.enter(Op::Recall).await?;
        Ok(sample_recall())
    }

    async fn generate_resources(&self, _section: &CourseSection) -> Result<Vec<RawResource>, AiError> {
        self.enter(Op::Resources).await?;
        Ok(sample_resources())
    }

    async fn evaluate_response(
        &self,
        question: &PracticeQuestion,
        chosen_index: usize,
        _section: &CourseSection,
        _attachment: &Attachment,
    ) -> Result<DeepInsight, AiError> {
        self.enter(Op::Evaluate).await?;
        Ok(keyed_insight(question, chosen_index))
    }
}

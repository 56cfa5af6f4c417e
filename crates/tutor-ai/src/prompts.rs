//! Prompt text and response schemas for each capability

use serde_json::{json, Value};
use tutor_model::{CourseSection, PracticeQuestion};

/// System instruction shared by every call
pub const SYSTEM_INSTRUCTION: &str = "You are an expert academic tutor. Ground every answer in \
the attached source material when one is provided. Reply with a single JSON value matching the \
requested schema. No prose, no code fences.";

/// Prompt and schema for one call
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub schema: Value,
}

fn unit_header(section: &CourseSection) -> String {
    let mut header = format!("Unit: \"{}\"", section.title);
    if !section.source_reference.is_empty() {
        header.push_str(&format!(" (source: {})", section.source_reference));
    }
    if !section.summary.is_empty() {
        header.push_str(&format!("\nUnit overview: {}", section.summary));
    }
    header
}

/// Structure extraction
#[must_use]
pub fn structure() -> Prompt {
    Prompt {
        text: "Read the attached document and divide it into an ordered curriculum of logical \
study units, following the document's own order. For each unit give a short title, a one or two \
sentence summary, the page or slide range it covers as sourceRange, and the titles of earlier \
units it builds on as dependencies."
            .to_string(),
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "summary": { "type": "STRING" },
                    "sourceRange": { "type": "STRING" },
                    "dependencies": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["title"]
            }
        }),
    }
}

/// Core stage
#[must_use]
pub fn core(section: &CourseSection) -> Prompt {
    Prompt {
        text: format!(
            "{}\n\nTeach this unit from the attached document. Write thorough explanatory \
content in Markdown, a concise summary, the key terms with their definitions, and any formulas \
or axioms as expression/label pairs.",
            unit_header(section)
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "content": { "type": "STRING" },
                "summary": { "type": "STRING" },
                "definitions": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "term": { "type": "STRING" },
                            "definition": { "type": "STRING" }
                        }
                    }
                },
                "axioms": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "expression": { "type": "STRING" },
                            "label": { "type": "STRING" }
                        }
                    }
                }
            },
            "required": ["content", "summary"]
        }),
    }
}

/// Logic stage
#[must_use]
pub fn logic(section: &CourseSection) -> Prompt {
    Prompt {
        text: format!(
            "{}\n\nBuild a concept mind map of this unit in Mermaid `mindmap` syntax, rooted at \
the unit title, showing how its ideas depend on each other.",
            unit_header(section)
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": { "mindmap": { "type": "STRING" } },
            "required": ["mindmap"]
        }),
    }
}

/// Recall stage
#[must_use]
pub fn recall(section: &CourseSection) -> Prompt {
    Prompt {
        text: format!(
            "{}\n\nWrite 6 to 10 flashcards (question/answer) and 4 to 6 multiple-choice exam \
questions for this unit. Each question has exactly four options and the zero-based index of the \
correct one as correctIndex, plus a one-line explanation.",
            unit_header(section)
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "flashcards": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "question": { "type": "STRING" },
                            "answer": { "type": "STRING" }
                        }
                    }
                },
                "questions": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "question": { "type": "STRING" },
                            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                            "correctIndex": { "type": "INTEGER" },
                            "explanation": { "type": "STRING" }
                        }
                    }
                }
            }
        }),
    }
}

/// Resources stage
#[must_use]
pub fn resources(section: &CourseSection) -> Prompt {
    Prompt {
        text: format!(
            "{}\n\nSuggest 3 to 5 reputable external resources (articles, lectures, videos) for \
studying this unit further. Give each a title, a URL, a kind, and a one-line description.",
            unit_header(section)
        ),
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "url": { "type": "STRING" },
                    "type": { "type": "STRING" },
                    "description": { "type": "STRING" }
                },
                "required": ["title", "url"]
            }
        }),
    }
}

/// Answer evaluation
#[must_use]
pub fn evaluation(
    question: &PracticeQuestion,
    chosen_index: usize,
    section: &CourseSection,
) -> Prompt {
    let options = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}. {}", option_letter(i), opt))
        .collect::<Vec<_>>()
        .join("\n");
    let chosen = question
        .options
        .get(chosen_index)
        .map(String::as_str)
        .unwrap_or("(no option)");
    Prompt {
        text: format!(
            "{}\n\nQuestion: {}\n{}\n\nThe student chose {}: \"{}\". The keyed answer is {}.\n\
Judge the choice against the attached document. Explain why it is correct or wrong, explain the \
correct answer, name the misconception if any, list concepts to review, and give one exam tip.",
            unit_header(section),
            question.question,
            options,
            option_letter(chosen_index),
            chosen,
            option_letter(question.correct_index),
        ),
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "isCorrect": { "type": "BOOLEAN" },
                "verdict": { "type": "STRING" },
                "whyUserChoiceIsCorrectOrWrong": { "type": "STRING" },
                "correctAnswerExplanation": { "type": "STRING" },
                "misconceptionDetected": { "type": "STRING" },
                "conceptsToReview": { "type": "ARRAY", "items": { "type": "STRING" } },
                "examTip": { "type": "STRING" }
            },
            "required": ["isCorrect", "verdict"]
        }),
    }
}

/// `A`, `B`, ... for option indices; falls back to the number past `Z`
#[must_use]
pub fn option_letter(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        (index + 1).to_string()
    }
}

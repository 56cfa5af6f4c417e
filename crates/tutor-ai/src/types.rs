//! Typed capability results
//!
//! The model's JSON is loosely shaped. Every field here has a documented
//! default, so a partial answer still deserializes; the orchestrator never
//! has to probe for missing keys.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One unit of the extracted document structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSection {
    /// Missing title becomes a placeholder at skeleton time
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Page/slide range in the source
    #[serde(alias = "sourceReference")]
    pub source_range: Option<String>,
    #[serde(deserialize_with = "strings_lenient")]
    pub dependencies: Vec<String>,
}

/// A term definition from the core stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDefinition {
    pub term: String,
    pub definition: String,
}

/// An axiom or formula from the core stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAxiom {
    pub expression: String,
    pub label: String,
}

/// Core stage result: explanatory content and vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreResult {
    pub content: String,
    pub summary: String,
    /// Longer summary; the short one is used when absent
    pub detailed_summary: Option<String>,
    pub definitions: Vec<RawDefinition>,
    pub axioms: Vec<RawAxiom>,
}

/// Logic stage result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicResult {
    /// Opaque structured text; a JSON object is kept as its JSON text
    #[serde(deserialize_with = "text_or_json")]
    pub mindmap: String,
}

/// A generated flashcard before ids and review state are assigned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFlashcard {
    pub question: String,
    pub answer: String,
}

/// A generated practice question before ids and answer state are assigned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawQuestion {
    pub question: String,
    /// `None` when the model omitted the options
    pub options: Option<Vec<String>>,
    pub correct_index: usize,
    pub explanation: Option<String>,
}

/// Recall stage result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallResult {
    pub flashcards: Vec<RawFlashcard>,
    #[serde(alias = "practiceQuestions")]
    pub questions: Vec<RawQuestion>,
}

/// A suggested resource; any score the model gives is discarded later
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResource {
    pub title: String,
    pub url: String,
    #[serde(alias = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub score: Option<f64>,
}

fn text_or_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn strings_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

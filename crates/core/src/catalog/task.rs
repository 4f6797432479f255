//! # Task Definitions
//!
//! The schema side of the catalog: questions, canonical keys, and the
//! per-task key map and output schema derived from them.

use crate::tools::merge::AnswerSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::OnceLock;

fn key_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"[^a-z0-9\s_]").expect("static pattern"),
            Regex::new(r"\s+").expect("static pattern"),
        )
    })
}

/// Derive the answer key for a question.
///
/// `"What is your name?*"` becomes `what_is_your_name`.
pub fn canonicalize(question: &str) -> String {
    let (disallowed, whitespace) = key_patterns();

    let trimmed = question.trim();
    let trimmed = trimmed.strip_suffix('*').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('?').unwrap_or(trimmed);
    let lowered = trimmed.to_lowercase();

    let cleaned = disallowed.replace_all(&lowered, "");
    whitespace.replace_all(cleaned.trim(), "_").into_owned()
}

/// A trailing `*` (ignoring trailing `?`) marks a question required.
pub fn is_required(question: &str) -> bool {
    question.trim().trim_end_matches('?').ends_with('*')
}

/// A question decoded once at load time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    /// Raw text as written in the task document
    pub text: String,
    /// Canonical answer key
    pub key: String,
    /// Whether an answer is mandatory for completion
    pub required: bool,
}

impl Question {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            key: canonicalize(&text),
            required: is_required(&text),
            text,
        }
    }
}

/// Explicit program/argument mapping for the execution bridge.
///
/// `{key}` placeholders in `program` or `args` are replaced by answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A task schema document as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    pub task_name: String,
    pub description: String,
    pub questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandTemplate>,
}

/// A loaded task. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub task_name: String,
    pub description: String,
    pub questions: Vec<Question>,
    /// canonical key -> original question text
    pub key_map: BTreeMap<String, String>,
    /// canonical key -> placeholder, rendered into the prompt as a hint
    pub output_schema: Map<String, Value>,
    pub command: Option<CommandTemplate>,
    /// Document the task was loaded from, if any
    pub source: Option<PathBuf>,
    required_keys: BTreeSet<String>,
}

impl TaskDefinition {
    pub fn from_document(doc: TaskDocument, source: Option<PathBuf>) -> Self {
        let questions: Vec<Question> = doc.questions.into_iter().map(Question::parse).collect();

        // Later questions win on key collision, requiredness included.
        let mut key_map = BTreeMap::new();
        let mut required = BTreeMap::new();
        for q in &questions {
            if let Some(previous) = key_map.insert(q.key.clone(), q.text.clone()) {
                tracing::warn!(
                    task = %doc.task_name,
                    key = %q.key,
                    previous = %previous,
                    replacement = %q.text,
                    "Questions share a canonical key; keeping the later one"
                );
            }
            required.insert(q.key.clone(), q.required);
        }
        let required_keys = required
            .into_iter()
            .filter_map(|(key, req)| req.then_some(key))
            .collect();

        let output_schema = doc.output_schema.unwrap_or_else(|| {
            questions
                .iter()
                .map(|q| (q.key.clone(), Value::String(String::new())))
                .collect()
        });

        Self {
            task_name: doc.task_name,
            description: doc.description,
            questions,
            key_map,
            output_schema,
            command: doc.command,
            source,
            required_keys,
        }
    }

    /// Keys that must be answered before the task is complete
    pub fn required_keys(&self) -> &BTreeSet<String> {
        &self.required_keys
    }

    /// Raw question strings in document order
    pub fn question_texts(&self) -> Vec<&str> {
        self.questions.iter().map(|q| q.text.as_str()).collect()
    }

    /// Required keys without a non-blank answer, in key order
    pub fn missing_required(&self, answers: &AnswerSet) -> Vec<&str> {
        self.required_keys
            .iter()
            .filter(|k| !answers.has_value(k))
            .map(String::as_str)
            .collect()
    }

    /// Every required key answered with a non-blank value
    pub fn is_complete(&self, answers: &AnswerSet) -> bool {
        self.missing_required(answers).is_empty()
    }
}

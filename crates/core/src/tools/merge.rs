//! # Answer Merge
//!
//! Folds freshly extracted answers into the running answer set.
//!
//! ## The Rule
//!
//! An incoming value overwrites only when it is non-null and non-blank
//! after trimming. Keys are never removed, so a task's answers can only
//! grow or improve across turns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Insertion-ordered canonical key -> answer mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Map<String, Value>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Present with a non-blank value
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    /// Values in insertion order
    pub fn values(&self) -> Vec<&str> {
        self.iter().map(|(_, v)| v).collect()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// String form of a model-supplied value, or `None` when it must not be stored
fn answer_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok()?,
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Merge `incoming` into `existing`. Returns how many keys were written.
pub fn merge_answers(existing: &mut AnswerSet, incoming: &Map<String, Value>) -> usize {
    let mut written = 0;
    for (key, value) in incoming {
        match answer_text(value) {
            Some(text) => {
                existing.insert(key.clone(), text);
                written += 1;
            }
            None => tracing::trace!(key = %key, "Skipping blank answer"),
        }
    }
    written
}

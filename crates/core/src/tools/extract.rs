//! # Response Extraction
//!
//! Pulls one JSON object out of a free-form model reply.
//!
//! Models wrap JSON in markdown fences, prefix it with prose, or emit stray
//! braces. The extractor strips an outer fence, then walks the text by brace
//! depth and returns the first balanced `{...}` span that parses as an
//! object. Braces inside string literals do not count toward depth.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Extract the first well-formed JSON object from `text`
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let body = strip_fences(text);

    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&body[start..]) {
            let candidate = &body[start..start + end];
            match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Object(map)) => return Some(map),
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Balanced span is not valid JSON"),
            }
        }
        search_from = start + 1;
    }

    if body.contains('{') {
        warn!("No parseable JSON object in model reply");
    }
    None
}

/// The parts of an extracted object the session cares about
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedReply {
    /// Task named by the model; `None` means no update
    pub task: Option<String>,
    /// Answers supplied by the model; `None` means no update
    pub data: Option<Map<String, Value>>,
}

impl ExtractedReply {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let task = match object.get("task") {
            Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(other) => {
                warn!(task = %other, "Ignoring non-string task field");
                None
            }
        };

        let data = match object.get("data") {
            Some(Value::Object(map)) => Some(map.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                warn!(data = %other, "Ignoring non-object data field");
                None
            }
        };

        Self { task, data }
    }

    /// Run extraction and field decoding in one step
    pub fn parse(text: &str) -> Option<Self> {
        extract_json_object(text).map(|object| Self::from_object(&object))
    }
}

fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Byte length of the balanced object starting at `text[0] == '{'`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

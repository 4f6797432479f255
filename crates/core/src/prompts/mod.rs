//! Prompt templates and rendering.
//!
//! The instruction block is bundled at compile time; the catalog is
//! appended at runtime. The result is sent once as the first turn of every
//! slot-filling conversation.

use crate::catalog::TaskCatalog;
use std::fmt::Write;

/// Task assistant instructions, rendered ahead of the catalog
pub const TASK_ASSISTANT: &str = include_str!("defaults/task_assistant.md");

/// Render the system prompt: instructions followed by every task
pub fn build_system_prompt(catalog: &TaskCatalog) -> String {
    let mut prompt = TASK_ASSISTANT.trim_end().to_string();

    for task in catalog.iter() {
        let questions = serde_json::to_string(&task.question_texts()).unwrap_or_default();
        let schema = serde_json::to_string(&task.output_schema).unwrap_or_default();
        let _ = write!(
            prompt,
            "\n\nTask: {}\nDescription: {}\nQuestions: {}\nOutput Schema: {}",
            task.task_name, task.description, questions, schema
        );
    }

    prompt
}

/// Opening message of the execution-mode conversation
pub fn build_summary_prompt(program: &str, stdout: &str, stderr: &str) -> String {
    let output = if stdout.is_empty() { "[No output]" } else { stdout };
    let mut prompt = format!("The output of the command `{}` is:\n\n{}", program, output);
    if !stderr.is_empty() {
        let _ = write!(prompt, "\n\nThere were also errors:\n{}", stderr);
    }
    prompt
}

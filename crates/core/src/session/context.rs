//! # Session Context
//!
//! State that outlives a single slot-filling loop.
//!
//! The last completed task is populated on completion, read by the
//! `run`/`automate` command, and retained until process exit. It is owned
//! by the `Assistant` and lent to each loop, never stored loop-locally.

use crate::tools::merge::AnswerSet;
use serde::{Deserialize, Serialize};

/// Task name used in records when no task was identified
pub const UNKNOWN_TASK: &str = "unknown_task";

/// A task whose required answers were all collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task_name: String,
    pub answers: AnswerSet,
}

/// The `{"task": ..., "data": {...}}` record shown on completion or exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub task: String,
    pub data: AnswerSet,
}

impl FinalRecord {
    pub fn new(task_name: Option<&str>, answers: &AnswerSet) -> Self {
        Self {
            task: task_name.unwrap_or(UNKNOWN_TASK).to_string(),
            data: answers.clone(),
        }
    }

    /// Indented JSON form
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl From<&CompletedTask> for FinalRecord {
    fn from(task: &CompletedTask) -> Self {
        Self::new(Some(&task.task_name), &task.answers)
    }
}

/// Cross-loop state for one process
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    last_completed: Option<CompletedTask>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a completed task, replacing any earlier one
    pub fn record_completion(&mut self, task: CompletedTask) {
        tracing::info!(
            task = %task.task_name,
            answers = task.answers.len(),
            "Task completed"
        );
        self.last_completed = Some(task);
    }

    pub fn last_completed(&self) -> Option<&CompletedTask> {
        self.last_completed.as_ref()
    }

    pub fn has_previous_task(&self) -> bool {
        self.last_completed.is_some()
    }
}

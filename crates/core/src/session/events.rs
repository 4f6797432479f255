//! # Session Events
//!
//! Everything the session wants the user to see, as data. Consoles decide
//! how to render it.

use super::context::FinalRecord;
use crate::llm::TokenUsage;
use crate::tools::merge::AnswerSet;
use crate::tools::terminal::CommandOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of session event, with its payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Assistant started
    Ready { model: String, tasks: usize },
    /// Token accounting for the last model call
    TokenUsage { usage: TokenUsage },
    /// Model reply with no structured content, shown verbatim
    ModelText { text: String },
    /// Answers collected so far in the current loop
    AnswersSoFar { answers: AnswerSet },
    /// A model call failed; nothing changed
    ModelError { message: String },
    /// All required answers collected
    TaskCompleted { record: FinalRecord },
    /// User left; record may be incomplete
    FinalRecord { record: FinalRecord },
    /// Closing acknowledgement after the final record
    Farewell,
    // === Execution bridge ===
    /// `run` with nothing completed yet
    NoPreviousTask,
    /// About to execute the last completed task
    RunningTask { task_name: String, answers: AnswerSet },
    /// Command line about to be spawned
    Executing { command_line: String },
    /// Captured process output
    ExecutionOutput { output: CommandOutput },
    /// Answers produced no program to run
    NoCommand,
    /// Program could not be found
    CommandNotFound { program: String },
    /// Any other execution fault
    ExecutionFailed { message: String },
    /// Model summary of the output
    Summary { text: String },
    /// Model answer to a follow-up question
    FollowUpReply { text: String },
    /// Left execution mode
    ReturningToMain,
    /// Execution flow finished
    ExecutionFinished,
}

/// An event in the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

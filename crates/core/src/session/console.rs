//! # Console Seam
//!
//! The session talks to the user only through `Console`: it asks for a
//! line and emits events. The binary renders to a terminal; tests replay a
//! script.

use super::events::{SessionEvent, SessionEventKind};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Words that end the session
pub const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

/// Words that execute the last completed task
pub const RUN_WORDS: &[&str] = &["run", "automate"];

/// Leaves execution mode
pub const GO_BACK: &str = "go back";

/// User I/O for a session
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line. `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;

    /// Present an event to the user
    fn emit(&mut self, event: SessionEvent);

    fn notify(&mut self, kind: SessionEventKind) {
        self.emit(SessionEvent::new(kind));
    }
}

/// What a line of user input means to the turn loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Exit,
    Run,
    Empty,
    Utterance(String),
}

impl UserCommand {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lowered = trimmed.to_lowercase();
        if trimmed.is_empty() {
            UserCommand::Empty
        } else if EXIT_WORDS.contains(&lowered.as_str()) {
            UserCommand::Exit
        } else if RUN_WORDS.contains(&lowered.as_str()) {
            UserCommand::Run
        } else {
            UserCommand::Utterance(trimmed.to_string())
        }
    }
}

/// True for the execution-mode exit phrase
pub fn is_go_back(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(GO_BACK)
}

/// A console that replays scripted input and records everything shown
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    prompts: Vec<String>,
    events: Vec<SessionEvent>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Prompts shown so far, oldest first
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<&SessionEventKind> {
        self.events.iter().map(|e| &e.kind).collect()
    }

    /// Unconsumed input lines
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front())
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

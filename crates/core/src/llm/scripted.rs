//! Replay model for tests and offline demos.
//!
//! Hands out queued replies in order and records every history it was
//! called with.

use super::{ChatMessage, ChatModel, LlmError, ModelReply};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Step {
    Reply(String),
    Failure { status: u16, message: String },
}

/// A `ChatModel` that replays a fixed script
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| Step::Reply(r.into()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(Step::Reply(reply.into()));
        }
    }

    /// Queue an API failure
    pub fn push_failure(&self, status: u16, message: impl Into<String>) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(Step::Failure {
                status,
                message: message.into(),
            });
        }
    }

    /// Every history the model has been called with, oldest first
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, history: &[ChatMessage]) -> Result<ModelReply, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(history.to_vec());
        }

        let step = self
            .steps
            .lock()
            .ok()
            .and_then(|mut steps| steps.pop_front())
            .ok_or(LlmError::Exhausted)?;

        match step {
            Step::Reply(text) => Ok(ModelReply::text(text)),
            Step::Failure { status, message } => Err(LlmError::Api { status, message }),
        }
    }
}

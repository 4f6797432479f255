//! # LLM Conversations
//!
//! The model seam. A `ChatModel` turns a full conversation history into one
//! reply; a `Conversation` owns that history and appends to it turn by turn.
//!
//! ```text
//! Conversation ──history──▶ ChatModel::generate ──▶ ModelReply
//!      ▲                                                │
//!      └──────────────── append (user, model) ◀─────────┘
//! ```

pub mod gemini;
pub mod scripted;

pub use gemini::GeminiChat;
pub use scripted::ScriptedModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a model call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("no API key configured")]
    MissingApiKey,

    #[error("scripted model has no replies left")]
    Exhausted,
}

/// Who authored a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Token accounting for one call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    /// True when the counts are a local guess rather than provider-reported
    #[serde(default)]
    pub estimated: bool,
}

impl TokenUsage {
    /// Rough guess used when the provider reports nothing: 1.3 tokens per word.
    pub fn estimate(text: &str) -> Self {
        let words = text.split_whitespace().count() as f64;
        let tokens = (words * 1.3).ceil() as u32;
        Self {
            prompt_tokens: Some(tokens),
            completion_tokens: None,
            total_tokens: Some(tokens),
            estimated: true,
        }
    }
}

/// The model's answer to one call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// A chat-capable language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier for display
    fn name(&self) -> &str;

    /// Produce the next model turn for the given history.
    ///
    /// The last message of `history` is the user turn being answered.
    async fn generate(&self, history: &[ChatMessage]) -> Result<ModelReply, LlmError>;
}

/// A running conversation: shared model plus private history
pub struct Conversation {
    model: Arc<dyn ChatModel>,
    history: Vec<ChatMessage>,
}

impl Conversation {
    /// Start an empty conversation
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    /// Start a conversation whose first user turn is `seed`.
    ///
    /// The seed is part of the context for every later call but is never
    /// sent on its own.
    pub fn seeded(model: Arc<dyn ChatModel>, seed: impl Into<String>) -> Self {
        Self {
            model,
            history: vec![ChatMessage::user(seed)],
        }
    }

    /// Send a user turn and record the model's reply.
    ///
    /// On failure the user turn is rolled back so the history keeps
    /// alternating roles.
    pub async fn send(&mut self, text: &str) -> Result<ModelReply, LlmError> {
        self.history.push(ChatMessage::user(text));
        tracing::debug!(model = %self.model.name(), turns = self.history.len(), "Sending turn");

        match self.model.generate(&self.history).await {
            Ok(reply) => {
                self.history.push(ChatMessage::model(reply.text.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

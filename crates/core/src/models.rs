//! # Concierge Models
//!
//! Centralized LLM configuration types for the Concierge system.
//! The session and the execution bridge both build their conversations
//! from a single `ModelConfig`.

use crate::llm::{ChatModel, GeminiChat, LlmError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Public Gemini REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for LLM model selection
///
/// ## Example
/// ```rust,ignore
/// use concierge_core::models::ModelConfig;
///
/// let config = ModelConfig::new("gemini-2.0-flash").with_api_key(key);
/// let model = config.create_llm()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name (e.g., "gemini-2.0-flash", "gemini-1.5-pro")
    #[serde(default = "default_model")]
    pub model: String,
    /// API credential. Never persisted back to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature forwarded to the provider
    #[serde(default)]
    pub temperature: Option<f32>,
    /// HTTP timeout in seconds. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

impl ModelConfig {
    /// Create a new model config for the given model name
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the API credential
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set base URL (for proxies or regional endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Endpoint root, falling back to the public API
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Create an LLM client from this configuration
    pub fn create_llm(&self) -> Result<Arc<dyn ChatModel>, LlmError> {
        Ok(Arc::new(GeminiChat::new(self.clone())?))
    }
}

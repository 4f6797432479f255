//! # Concierge Core
//!
//! Slot-filling task assistant: a language model picks the next question,
//! deterministic code decides what was answered and when a task is done.
//!
//! ## Architecture
//!
//! - `catalog/` - Task schema documents and name resolution
//! - `prompts/` - Bundled instructions and prompt rendering
//! - `llm/` - Chat model seam, Gemini client, scripted double
//! - `tools/` - Reply extraction, answer merge, process invocation
//! - `session/` - Turn loop, outer loop, execution bridge
//! - `models` / `config` - Model and assistant configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concierge_core::{catalog::TaskCatalog, models::ModelConfig, session::Assistant};
//!
//! let catalog = TaskCatalog::load("tasks")?;
//! let model = ModelConfig::default().with_api_key(key).create_llm()?;
//! Assistant::new(catalog, model).run(&mut console).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod session;
pub mod tools;

//! # Task Catalog
//!
//! Task schema documents and everything derived from them.
//!
//! ```text
//! tasks/*.json ──load──▶ TaskDocument ──decode──▶ TaskDefinition
//!                                                  ├── questions (text, key, required)
//!                                                  ├── key_map
//!                                                  └── output_schema
//! ```

pub mod loader;
pub mod task;

pub use loader::{CatalogError, TaskCatalog, TaskLookup};
pub use task::{canonicalize, is_required, CommandTemplate, Question, TaskDefinition, TaskDocument};

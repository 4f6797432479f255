//! # Deterministic Tools
//!
//! Plain Rust around the model's free text: everything the session trusts
//! goes through one of these.
//!
//! ## Modules
//!
//! - `extract` - JSON object extraction from model replies
//! - `merge` - Monotonic answer merge
//! - `terminal` - Direct child-process invocation with captured output

pub mod extract;
pub mod merge;
pub mod terminal;

pub use extract::{extract_json_object, ExtractedReply};
pub use merge::{merge_answers, AnswerSet};
pub use terminal::{CommandOutput, ExecutionError, Invocation};

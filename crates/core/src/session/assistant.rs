//! # Assistant
//!
//! The outer loop: one slot-filling session after another, each with a
//! fresh conversation, until the user exits.

use super::console::Console;
use super::context::SessionContext;
use super::events::SessionEventKind;
use super::execution::ExecutionBridge;
use super::slot_filling::{LoopOutcome, SlotFillingSession};
use crate::catalog::TaskCatalog;
use crate::llm::{ChatModel, Conversation};
use crate::prompts::build_system_prompt;
use std::sync::Arc;
use tracing::info;

/// Task assistant over a loaded catalog
pub struct Assistant {
    catalog: TaskCatalog,
    model: Arc<dyn ChatModel>,
    system_prompt: String,
    context: SessionContext,
}

impl Assistant {
    pub fn new(catalog: TaskCatalog, model: Arc<dyn ChatModel>) -> Self {
        let system_prompt = build_system_prompt(&catalog);
        Self {
            catalog,
            model,
            system_prompt,
            context: SessionContext::new(),
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The prompt every slot-filling conversation is seeded with
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run sessions until the user exits or input ends
    pub async fn run(&mut self, console: &mut dyn Console) -> anyhow::Result<()> {
        info!(
            model = self.model.name(),
            tasks = self.catalog.len(),
            "Assistant started"
        );
        console.notify(SessionEventKind::Ready {
            model: self.model.name().to_string(),
            tasks: self.catalog.len(),
        });

        let bridge = ExecutionBridge::new(&self.catalog, self.model.clone());
        loop {
            let conversation = Conversation::seeded(self.model.clone(), self.system_prompt.clone());
            let mut session = SlotFillingSession::new(&self.catalog, conversation);

            match session.run(console, &mut self.context, &bridge).await? {
                LoopOutcome::Completed(task) => {
                    info!(task = %task.task_name, "Starting a new session");
                }
                LoopOutcome::Exited => {
                    info!("Assistant stopped");
                    return Ok(());
                }
            }
        }
    }
}

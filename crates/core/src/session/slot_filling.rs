//! # Slot-Filling Session
//!
//! The turn loop that collects answers for one task.
//!
//! ## Phases
//!
//! ```text
//! Idle ──model names a task──▶ Collecting ──required keys answered──▶ Complete
//! ```
//!
//! The model picks which question to ask; completion is always decided
//! here, against the catalog, never taken from the model's word.

use super::console::{Console, UserCommand};
use super::context::{CompletedTask, FinalRecord, SessionContext};
use super::events::SessionEventKind;
use super::execution::ExecutionBridge;
use crate::catalog::{TaskCatalog, TaskDefinition};
use crate::llm::{Conversation, TokenUsage};
use crate::tools::extract::ExtractedReply;
use crate::tools::merge::{merge_answers, AnswerSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prompt for subsequent answers
pub const ANSWER_PROMPT: &str = "Your answer (or type exit):";

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPhase {
    /// No task identified yet
    Idle,
    /// Task named, required answers outstanding
    Collecting,
    /// Every required answer present
    Complete,
}

/// Mutable state of one loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotState {
    pub task_name: Option<String>,
    pub answers: AnswerSet,
}

/// What a model reply did to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A JSON object was found and applied
    Structured { task_changed: bool, answers_written: usize },
    /// Prose only; state untouched
    Unstructured,
}

/// How a loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    Completed(CompletedTask),
    Exited,
}

/// One slot-filling conversation
pub struct SlotFillingSession<'a> {
    catalog: &'a TaskCatalog,
    conversation: Conversation,
    state: SlotState,
}

impl<'a> SlotFillingSession<'a> {
    /// `conversation` should already carry the system prompt
    pub fn new(catalog: &'a TaskCatalog, conversation: Conversation) -> Self {
        Self {
            catalog,
            conversation,
            state: SlotState::default(),
        }
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Catalog entry for the task the model named, if it resolves
    pub fn current_task(&self) -> Option<&'a TaskDefinition> {
        self.state
            .task_name
            .as_deref()
            .and_then(|name| self.catalog.find_by_name(name))
    }

    pub fn phase(&self) -> SlotPhase {
        match (&self.state.task_name, self.current_task()) {
            (None, _) => SlotPhase::Idle,
            (Some(_), Some(task)) if task.is_complete(&self.state.answers) => SlotPhase::Complete,
            (Some(_), _) => SlotPhase::Collecting,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SlotPhase::Complete
    }

    /// Required keys still unanswered for the current task
    pub fn missing_required(&self) -> Vec<&'a str> {
        match self.current_task() {
            Some(task) => task.missing_required(&self.state.answers),
            None => Vec::new(),
        }
    }

    /// Fold one model reply into the state
    pub fn apply_reply(&mut self, text: &str) -> ReplyOutcome {
        let Some(reply) = ExtractedReply::parse(text) else {
            return ReplyOutcome::Unstructured;
        };

        let mut task_changed = false;
        if let Some(task) = reply.task {
            task_changed = self.state.task_name.as_deref() != Some(task.as_str());
            if task_changed {
                debug!(task = %task, "Model identified task");
            }
            self.state.task_name = Some(task);
        }

        let answers_written = reply
            .data
            .map(|data| merge_answers(&mut self.state.answers, &data))
            .unwrap_or(0);

        ReplyOutcome::Structured {
            task_changed,
            answers_written,
        }
    }

    /// Snapshot of the finished task, named as in the catalog
    pub fn completion(&self) -> Option<CompletedTask> {
        let task = self.current_task()?;
        task.is_complete(&self.state.answers).then(|| CompletedTask {
            task_name: task.task_name.clone(),
            answers: self.state.answers.clone(),
        })
    }

    /// Record for the current state, complete or not
    pub fn final_record(&self) -> FinalRecord {
        FinalRecord::new(self.state.task_name.as_deref(), &self.state.answers)
    }

    /// Drive the loop until the task completes or the user leaves
    pub async fn run(
        &mut self,
        console: &mut dyn Console,
        ctx: &mut SessionContext,
        bridge: &ExecutionBridge<'_>,
    ) -> anyhow::Result<LoopOutcome> {
        let mut opening = true;

        loop {
            if let Some(completed) = self.completion() {
                ctx.record_completion(completed.clone());
                console.notify(SessionEventKind::TaskCompleted {
                    record: FinalRecord::from(&completed),
                });
                return Ok(LoopOutcome::Completed(completed));
            }

            let prompt = if opening {
                opening_prompt(ctx)
            } else {
                if !self.state.answers.is_empty() {
                    console.notify(SessionEventKind::AnswersSoFar {
                        answers: self.state.answers.clone(),
                    });
                }
                ANSWER_PROMPT.to_string()
            };

            let command = match console.ask(&prompt).await? {
                Some(input) => UserCommand::parse(&input),
                None => UserCommand::Exit,
            };

            match command {
                UserCommand::Exit => {
                    console.notify(SessionEventKind::FinalRecord {
                        record: self.final_record(),
                    });
                    console.notify(SessionEventKind::Farewell);
                    return Ok(LoopOutcome::Exited);
                }
                UserCommand::Run => match ctx.last_completed() {
                    Some(last) => {
                        bridge.run(&last.task_name, &last.answers, console).await?;
                    }
                    None => console.notify(SessionEventKind::NoPreviousTask),
                },
                UserCommand::Empty => {}
                UserCommand::Utterance(text) => {
                    if self.take_turn(&text, console).await {
                        opening = false;
                    }
                }
            }
        }
    }

    /// Send one utterance. Returns false when the model call failed.
    async fn take_turn(&mut self, text: &str, console: &mut dyn Console) -> bool {
        let reply = match self.conversation.send(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Model call failed");
                console.notify(SessionEventKind::ModelError {
                    message: e.to_string(),
                });
                return false;
            }
        };

        console.notify(SessionEventKind::TokenUsage {
            usage: reply.usage.unwrap_or_else(|| TokenUsage::estimate(text)),
        });

        match self.apply_reply(&reply.text) {
            ReplyOutcome::Unstructured => console.notify(SessionEventKind::ModelText {
                text: reply.text,
            }),
            ReplyOutcome::Structured {
                task_changed,
                answers_written,
            } => debug!(
                task_changed,
                answers_written,
                phase = ?self.phase(),
                "Applied structured reply"
            ),
        }
        true
    }
}

fn opening_prompt(ctx: &SessionContext) -> String {
    if ctx.has_previous_task() {
        "What do you want to do? (type 'exit' to quit, or 'run'/'automate' to execute the last task)"
            .to_string()
    } else {
        "What do you want to do? (type 'exit' to quit)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TaskDocument;
    use crate::llm::ScriptedModel;
    use crate::session::console::ScriptedConsole;
    use std::sync::Arc;

    fn catalog() -> TaskCatalog {
        TaskCatalog::from_documents([TaskDocument {
            task_name: "Book Flight".to_string(),
            description: "Book a plane ticket".to_string(),
            questions: vec![
                "Destination*".to_string(),
                "Date*".to_string(),
                "Seat class".to_string(),
            ],
            output_schema: None,
            command: None,
        }])
    }

    fn session<'a>(catalog: &'a TaskCatalog, model: Arc<ScriptedModel>) -> SlotFillingSession<'a> {
        SlotFillingSession::new(catalog, Conversation::seeded(model, "system prompt"))
    }

    #[test]
    fn test_phases_follow_answers() {
        let catalog = catalog();
        let mut s = session(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));
        assert_eq!(s.phase(), SlotPhase::Idle);

        let outcome =
            s.apply_reply(r#"{"task":"Book Flight","data":{"destination":"Tokyo"}}"#);
        assert_eq!(
            outcome,
            ReplyOutcome::Structured {
                task_changed: true,
                answers_written: 1
            }
        );
        assert_eq!(s.phase(), SlotPhase::Collecting);
        assert_eq!(s.missing_required(), vec!["date"]);

        s.apply_reply(r#"```json
{"data": {"date": "2025-03-01"}}
```"#);
        assert_eq!(s.state().task_name.as_deref(), Some("Book Flight"));
        assert!(s.is_complete());

        let done = s.completion().unwrap();
        assert_eq!(done.answers.get("seat_class"), None);
    }

    #[test]
    fn test_prose_reply_leaves_state() {
        let catalog = catalog();
        let mut s = session(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));
        s.apply_reply(r#"{"task":"Book Flight","data":{"destination":"Tokyo"}}"#);
        let before = s.state().clone();

        assert_eq!(s.apply_reply("When do you want to fly?"), ReplyOutcome::Unstructured);
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn test_model_claim_is_not_completion() {
        let catalog = catalog();
        let mut s = session(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));
        s.apply_reply(r#"{"task":"Book Flight","data":{"destination":"Tokyo","date":" "}}"#);
        assert!(!s.is_complete());
        assert!(s.completion().is_none());
    }

    #[test]
    fn test_unknown_task_stays_collecting() {
        let catalog = catalog();
        let mut s = session(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));
        s.apply_reply(r#"{"task":"Rent Car","data":{"city":"Paris"}}"#);
        assert_eq!(s.phase(), SlotPhase::Collecting);
        assert!(s.missing_required().is_empty());
        assert_eq!(s.final_record().task, "Rent Car");
    }

    #[tokio::test]
    async fn test_run_without_previous_task() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut ctx = SessionContext::new();
        let mut console = ScriptedConsole::new(["run", "exit"]);

        let mut s = session(&catalog, model.clone());
        let outcome = s.run(&mut console, &mut ctx, &bridge).await.unwrap();

        assert_eq!(outcome, LoopOutcome::Exited);
        assert!(console.kinds().contains(&&SessionEventKind::NoPreviousTask));
        assert!(model.calls().is_empty());
        // The opening prompt repeats after `run`.
        assert_eq!(console.prompts()[0], console.prompts()[1]);
    }

    #[tokio::test]
    async fn test_exit_emits_partial_record() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new([
            r#"{"task":"Book Flight","data":{"destination":"Tokyo"}}"#,
        ]));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut ctx = SessionContext::new();
        let mut console = ScriptedConsole::new(["book a flight to Tokyo", "quit"]);

        let mut s = session(&catalog, model.clone());
        assert_eq!(
            s.run(&mut console, &mut ctx, &bridge).await.unwrap(),
            LoopOutcome::Exited
        );

        let record = console
            .kinds()
            .into_iter()
            .find_map(|k| match k {
                SessionEventKind::FinalRecord { record } => Some(record.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(record.task, "Book Flight");
        assert_eq!(record.data.get("destination"), Some("Tokyo"));
        assert!(!ctx.has_previous_task());
    }

    #[tokio::test]
    async fn test_model_failure_keeps_going() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        model.push_failure(500, "internal");
        model.push_reply("Where would you like to go?");
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut ctx = SessionContext::new();
        let mut console = ScriptedConsole::new(["book a flight", "book a flight", "exit"]);

        let mut s = session(&catalog, model.clone());
        s.run(&mut console, &mut ctx, &bridge).await.unwrap();

        let kinds = console.kinds();
        assert!(matches!(kinds[0], SessionEventKind::ModelError { .. }));
        assert!(kinds.contains(&&SessionEventKind::ModelText {
            text: "Where would you like to go?".to_string()
        }));
        assert_eq!(s.conversation().history().len(), 3);

        // A failed first call leaves the opening prompt in place.
        let prompts = console.prompts();
        assert_eq!(prompts[0], prompts[1]);
        assert_eq!(prompts[2], ANSWER_PROMPT);
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut ctx = SessionContext::new();
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let mut s = session(&catalog, model);
        assert_eq!(
            s.run(&mut console, &mut ctx, &bridge).await.unwrap(),
            LoopOutcome::Exited
        );
        assert_eq!(console.kinds().last(), Some(&&SessionEventKind::Farewell));
    }
}

//! # Execution Bridge
//!
//! Hands a completed answer set to an external program, then opens a
//! nested conversation about what the program printed.
//!
//! ## Flow
//!
//! ```text
//! CompletedTask → Invocation → child process → CommandOutput
//!                                                  ↓
//!                          fresh Conversation ← summary prompt
//!                                  ↓
//!                   follow-up questions until "go back"
//! ```

use super::console::{is_go_back, Console};
use super::events::SessionEventKind;
use crate::catalog::TaskCatalog;
use crate::llm::{ChatModel, Conversation};
use crate::prompts::build_summary_prompt;
use crate::tools::merge::AnswerSet;
use crate::tools::terminal::{CommandOutput, ExecutionError, Invocation};
use std::sync::Arc;
use tracing::warn;

/// Prompt shown while discussing a command's output
pub const EXECUTION_PROMPT: &str = "(Execution Mode) Ask about result or type 'go back':";

/// Runs completed tasks and discusses their output
pub struct ExecutionBridge<'a> {
    catalog: &'a TaskCatalog,
    model: Arc<dyn ChatModel>,
}

impl<'a> ExecutionBridge<'a> {
    pub fn new(catalog: &'a TaskCatalog, model: Arc<dyn ChatModel>) -> Self {
        Self { catalog, model }
    }

    /// Build the invocation for a task.
    ///
    /// The task's command template wins; without one the answer values are
    /// used in insertion order.
    pub fn plan(&self, task_name: &str, answers: &AnswerSet) -> Result<Invocation, ExecutionError> {
        match self
            .catalog
            .find_by_name(task_name)
            .and_then(|t| t.command.as_ref())
        {
            Some(template) => Invocation::from_template(template, answers),
            None => Invocation::from_answers(answers),
        }
    }

    /// Execute a completed task and enter execution mode.
    ///
    /// Faults are reported to the console, not returned; the outer loop
    /// always continues. Returns the captured output when the program ran.
    pub async fn run(
        &self,
        task_name: &str,
        answers: &AnswerSet,
        console: &mut dyn Console,
    ) -> anyhow::Result<Option<CommandOutput>> {
        console.notify(SessionEventKind::RunningTask {
            task_name: task_name.to_string(),
            answers: answers.clone(),
        });

        let outcome = match self.plan(task_name, answers) {
            Ok(invocation) => {
                console.notify(SessionEventKind::Executing {
                    command_line: invocation.command_line(),
                });
                invocation.run().await.map(|output| (invocation, output))
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok((invocation, output)) => {
                console.notify(SessionEventKind::ExecutionOutput {
                    output: output.clone(),
                });
                self.discuss(&invocation, &output, console).await?;
                Some(output)
            }
            Err(e) => {
                report_fault(&e, console);
                None
            }
        };

        console.notify(SessionEventKind::ExecutionFinished);
        Ok(result)
    }

    async fn discuss(
        &self,
        invocation: &Invocation,
        output: &CommandOutput,
        console: &mut dyn Console,
    ) -> anyhow::Result<()> {
        let mut conversation = Conversation::new(self.model.clone());
        let prompt = build_summary_prompt(&invocation.program, &output.stdout, &output.stderr);

        match conversation.send(&prompt).await {
            Ok(reply) => console.notify(SessionEventKind::Summary {
                text: reply.text.trim().to_string(),
            }),
            Err(e) => {
                warn!(error = %e, "Summary request failed");
                console.notify(SessionEventKind::ModelError {
                    message: e.to_string(),
                });
            }
        }

        while let Some(input) = console.ask(EXECUTION_PROMPT).await? {
            if is_go_back(&input) {
                break;
            }
            let question = input.trim();
            if question.is_empty() {
                continue;
            }
            match conversation.send(question).await {
                Ok(reply) => console.notify(SessionEventKind::FollowUpReply {
                    text: reply.text.trim().to_string(),
                }),
                Err(e) => {
                    warn!(error = %e, "Follow-up request failed");
                    console.notify(SessionEventKind::ModelError {
                        message: e.to_string(),
                    });
                }
            }
        }

        console.notify(SessionEventKind::ReturningToMain);
        Ok(())
    }
}

fn report_fault(error: &ExecutionError, console: &mut dyn Console) {
    warn!(error = %error, "Execution failed");
    let kind = match error {
        ExecutionError::NoCommand => SessionEventKind::NoCommand,
        ExecutionError::CommandNotFound(program) => SessionEventKind::CommandNotFound {
            program: program.clone(),
        },
        other => SessionEventKind::ExecutionFailed {
            message: other.to_string(),
        },
    };
    console.notify(kind);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CommandTemplate, TaskDocument};
    use crate::llm::ScriptedModel;
    use crate::session::console::ScriptedConsole;

    fn catalog() -> TaskCatalog {
        TaskCatalog::from_documents([
            TaskDocument {
                task_name: "Echo".to_string(),
                description: "Print text".to_string(),
                questions: vec!["Text*".to_string()],
                output_schema: None,
                command: Some(CommandTemplate {
                    program: "echo".to_string(),
                    args: vec!["{text}".to_string()],
                }),
            },
            TaskDocument {
                task_name: "Raw".to_string(),
                description: "Run whatever was answered".to_string(),
                questions: vec!["Program*".to_string(), "Argument".to_string()],
                output_schema: None,
                command: None,
            },
        ])
    }

    #[test]
    fn test_plan_prefers_template() {
        let catalog = catalog();
        let bridge = ExecutionBridge::new(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));

        let answers: AnswerSet = [("text", "hi")].into_iter().collect();
        let inv = bridge.plan("Echo", &answers).unwrap();
        assert_eq!(inv.program, "echo");
        assert_eq!(inv.args, vec!["hi"]);

        let answers: AnswerSet = [("program", "ls"), ("argument", "-a")].into_iter().collect();
        let inv = bridge.plan("Raw", &answers).unwrap();
        assert_eq!(inv.command_line(), "ls -a");
    }

    #[tokio::test]
    async fn test_not_found_is_reported_distinctly() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let answers: AnswerSet = [("program", "no-such-binary-93417")].into_iter().collect();
        let result = bridge.run("Raw", &answers, &mut console).await.unwrap();

        assert!(result.is_none());
        assert!(console.kinds().contains(&&SessionEventKind::CommandNotFound {
            program: "no-such-binary-93417".to_string()
        }));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_command() {
        let catalog = catalog();
        let bridge = ExecutionBridge::new(&catalog, Arc::new(ScriptedModel::new(Vec::<String>::new())));
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        bridge.run("Raw", &AnswerSet::new(), &mut console).await.unwrap();
        assert!(console.kinds().contains(&&SessionEventKind::NoCommand));
    }

    #[tokio::test]
    async fn test_unanswered_placeholder_fails_before_spawn() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let answers: AnswerSet = [("other", "x")].into_iter().collect();
        let result = bridge.run("Echo", &answers, &mut console).await.unwrap();

        assert!(result.is_none());
        let kinds = console.kinds();
        assert!(kinds.iter().any(|k| matches!(
            k,
            SessionEventKind::ExecutionFailed { message } if message.contains("text")
        )));
        assert!(!kinds
            .iter()
            .any(|k| matches!(k, SessionEventKind::Executing { .. })));
        assert_eq!(kinds.last(), Some(&&SessionEventKind::ExecutionFinished));
        assert!(model.calls().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_executable_program_is_reported() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new(Vec::<String>::new()));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut console = ScriptedConsole::new(Vec::<String>::new());

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().to_string_lossy().to_string();
        let answers: AnswerSet = [("program", program.as_str())].into_iter().collect();
        let result = bridge.run("Raw", &answers, &mut console).await.unwrap();

        assert!(result.is_none());
        let kinds = console.kinds();
        assert!(kinds
            .iter()
            .any(|k| matches!(k, SessionEventKind::ExecutionFailed { .. })));
        assert!(!kinds
            .iter()
            .any(|k| matches!(k, SessionEventKind::CommandNotFound { .. })));
        assert_eq!(kinds.last(), Some(&&SessionEventKind::ExecutionFinished));
        assert!(model.calls().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_summary_and_follow_up() {
        let catalog = catalog();
        let model = Arc::new(ScriptedModel::new([
            "It printed a greeting.",
            "Yes, it succeeded.",
        ]));
        let bridge = ExecutionBridge::new(&catalog, model.clone());
        let mut console = ScriptedConsole::new(["did it work?", "GO BACK"]);

        let answers: AnswerSet = [("text", "hello")].into_iter().collect();
        let output = bridge.run("Echo", &answers, &mut console).await.unwrap().unwrap();
        assert_eq!(output.stdout, "hello");

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0][0].text,
            "The output of the command `echo` is:\n\nhello"
        );
        assert_eq!(calls[1].len(), 3);

        let kinds = console.kinds();
        assert!(kinds.contains(&&SessionEventKind::Summary {
            text: "It printed a greeting.".to_string()
        }));
        assert!(kinds.contains(&&SessionEventKind::FollowUpReply {
            text: "Yes, it succeeded.".to_string()
        }));
        assert_eq!(kinds.last(), Some(&&SessionEventKind::ExecutionFinished));
        assert_eq!(console.remaining(), 0);
    }
}

//! # Terminal Invocation
//!
//! Turns a completed answer set into a child-process call and captures its
//! output as text.
//!
//! ## Philosophy
//!
//! No shell is ever involved. The program is spawned directly with
//! positional arguments, so answers are passed through verbatim and never
//! interpreted as shell syntax.

use crate::catalog::CommandTemplate;
use crate::tools::merge::AnswerSet;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::process::Command;

/// Faults while building or running an invocation
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("no command to run")]
    NoCommand,

    #[error("no answer for '{0}' referenced by the command template")]
    MissingAnswer(String),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A program plus its positional arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutput {
    /// Trimmed standard output
    pub stdout: String,
    /// Trimmed standard error
    pub stderr: String,
    /// Exit code, absent when killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-z0-9_]+)\}").expect("static pattern"))
}

fn fill(token: &str, answers: &AnswerSet) -> Result<String, ExecutionError> {
    let mut missing = None;
    let filled = placeholder_pattern().replace_all(token, |caps: &Captures| {
        let key = &caps[1];
        match answers.get(key) {
            Some(value) => value.to_string(),
            None => {
                missing.get_or_insert_with(|| key.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(key) => Err(ExecutionError::MissingAnswer(key)),
        None => Ok(filled.into_owned()),
    }
}

impl Invocation {
    /// Substitute `{key}` placeholders in a command template
    pub fn from_template(
        template: &CommandTemplate,
        answers: &AnswerSet,
    ) -> Result<Self, ExecutionError> {
        let program = fill(&template.program, answers)?;
        if program.trim().is_empty() {
            return Err(ExecutionError::NoCommand);
        }
        let args = template
            .args
            .iter()
            .map(|arg| fill(arg, answers))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { program, args })
    }

    /// Answer values in insertion order: first is the program, rest are arguments
    pub fn from_answers(answers: &AnswerSet) -> Result<Self, ExecutionError> {
        let mut values = answers.values().into_iter().map(str::to_string);
        let program = values.next().ok_or(ExecutionError::NoCommand)?;
        Ok(Self {
            program,
            args: values.collect(),
        })
    }

    /// Printable form, for display only
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn the program, wait for it, and capture its output
    pub async fn run(&self) -> Result<CommandOutput, ExecutionError> {
        tracing::info!(program = %self.program, args = ?self.args, "Executing command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ExecutionError::CommandNotFound(self.program.clone()),
                _ => ExecutionError::Spawn {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> AnswerSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_from_answers_uses_insertion_order() {
        let inv = Invocation::from_answers(&answers(&[("program", "echo"), ("text", "hello world")]))
            .unwrap();
        assert_eq!(inv.program, "echo");
        assert_eq!(inv.args, vec!["hello world"]);
        assert_eq!(inv.command_line(), "echo hello world");
    }

    #[test]
    fn test_from_answers_empty() {
        assert!(matches!(
            Invocation::from_answers(&AnswerSet::new()),
            Err(ExecutionError::NoCommand)
        ));
    }

    #[test]
    fn test_template_substitution() {
        let template = CommandTemplate {
            program: "ls".to_string(),
            args: vec!["-la".to_string(), "--color={color}".to_string(), "{directory}".to_string()],
        };
        let inv = Invocation::from_template(
            &template,
            &answers(&[("directory", "/tmp"), ("color", "never")]),
        )
        .unwrap();
        assert_eq!(inv.args, vec!["-la", "--color=never", "/tmp"]);
    }

    #[test]
    fn test_template_missing_answer() {
        let template = CommandTemplate {
            program: "{tool}".to_string(),
            args: vec![],
        };
        match Invocation::from_template(&template, &AnswerSet::new()) {
            Err(ExecutionError::MissingAnswer(key)) => assert_eq!(key, "tool"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_not_found() {
        let inv = Invocation {
            program: "definitely-not-a-real-program-4821".to_string(),
            args: vec![],
        };
        match inv.run().await {
            Err(ExecutionError::CommandNotFound(p)) => assert_eq!(p, inv.program),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_trimmed_output() {
        let inv = Invocation {
            program: "echo".to_string(),
            args: vec!["  hello  ".to_string()],
        };
        let output = inv.run().await.unwrap();
        assert_eq!(output.stdout, "hello");
        assert!(output.stderr.is_empty());
        assert!(output.success());
    }
}

//! Terminal rendering of session events.

use async_trait::async_trait;
use concierge_core::llm::TokenUsage;
use concierge_core::session::{Console, SessionEvent, SessionEventKind};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Line-oriented console over any reader and writer
pub struct TerminalConsole<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> TerminalConsole<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> Console for TerminalConsole<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.writer, "\n{} ", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            writeln!(self.writer)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn emit(&mut self, event: SessionEvent) {
        let text = render(&event.kind);
        if let Err(e) = writeln!(self.writer, "{}", text).and_then(|_| self.writer.flush()) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn render_usage(usage: &TokenUsage) -> String {
    let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
    let mut line = format!(
        "💬 Tokens: prompt {}, completion {}, total {}",
        count(usage.prompt_tokens),
        count(usage.completion_tokens),
        count(usage.total_tokens)
    );
    if usage.estimated {
        line.push_str(" (estimated)");
    }
    line
}

/// Text shown for an event
pub fn render(kind: &SessionEventKind) -> String {
    match kind {
        SessionEventKind::Ready { model, tasks } => {
            format!("🤖 Concierge ready: {} task(s) loaded, model {}", tasks, model)
        }
        SessionEventKind::TokenUsage { usage } => render_usage(usage),
        SessionEventKind::ModelText { text } => format!("🤖 {}", text.trim()),
        SessionEventKind::AnswersSoFar { answers } => {
            format!("📋 Answers so far:\n{}", pretty(answers))
        }
        SessionEventKind::ModelError { message } => format!("⚠️  Model error: {}", message),
        SessionEventKind::TaskCompleted { record } => {
            format!(
                "✅ Task completed:\n{}\nType 'run' or 'automate' to execute it.",
                record.to_pretty_json()
            )
        }
        SessionEventKind::FinalRecord { record } => {
            format!("📦 Final record:\n{}", record.to_pretty_json())
        }
        SessionEventKind::Farewell => "👋 Goodbye!".to_string(),
        SessionEventKind::NoPreviousTask => {
            "⚠️  No previous task to run. Complete a task first.".to_string()
        }
        SessionEventKind::RunningTask { task_name, answers } => format!(
            "🚀 Running task '{}' with answers:\n{}",
            task_name,
            pretty(answers)
        ),
        SessionEventKind::Executing { command_line } => format!("▶️  Executing: {}", command_line),
        SessionEventKind::ExecutionOutput { output } => {
            let mut text = if output.stdout.is_empty() {
                "📤 Output: [No Output]".to_string()
            } else {
                format!("📤 Output:\n{}", output.stdout)
            };
            if !output.stderr.is_empty() {
                text.push_str(&format!("\n❗ Errors:\n{}", output.stderr));
            }
            if !output.success() {
                match output.exit_code {
                    Some(code) => text.push_str(&format!("\n(exit code {})", code)),
                    None => text.push_str("\n(terminated by signal)"),
                }
            }
            text
        }
        SessionEventKind::NoCommand => "⚠️  The task's answers contain no command to run.".to_string(),
        SessionEventKind::CommandNotFound { program } => {
            format!("❌ Command not found: {}", program)
        }
        SessionEventKind::ExecutionFailed { message } => format!("❌ Execution failed: {}", message),
        SessionEventKind::Summary { text } => format!("📝 {}", text),
        SessionEventKind::FollowUpReply { text } => format!("🤖 {}", text),
        SessionEventKind::ReturningToMain => "↩️  Returning to main conversation.".to_string(),
        SessionEventKind::ExecutionFinished => "✅ Task completed.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::session::FinalRecord;
    use concierge_core::tools::AnswerSet;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_ask_reads_lines_until_eof() {
        let reader = tokio_test::io::Builder::new().read(b"book a flight\r\n").build();
        let mut console = TerminalConsole::new(BufReader::new(reader), Vec::new());

        let first = console.ask("What do you want to do?").await.unwrap();
        assert_eq!(first.as_deref(), Some("book a flight"));
        assert_eq!(console.ask("Your answer (or type exit):").await.unwrap(), None);

        let shown = String::from_utf8(console.into_writer()).unwrap();
        assert!(shown.contains("What do you want to do? "));
        assert!(shown.contains("Your answer (or type exit): "));
    }

    #[tokio::test]
    async fn test_emit_writes_final_record() {
        let reader = tokio_test::io::Builder::new().build();
        let mut console = TerminalConsole::new(BufReader::new(reader), Vec::new());

        let answers: AnswerSet = [("destination", "Tokyo")].into_iter().collect();
        console.notify(SessionEventKind::FinalRecord {
            record: FinalRecord::new(Some("Book Flight"), &answers),
        });
        console.notify(SessionEventKind::Farewell);

        let shown = String::from_utf8(console.into_writer()).unwrap();
        assert_eq!(
            shown,
            "📦 Final record:\n{\n  \"task\": \"Book Flight\",\n  \"data\": {\n    \"destination\": \"Tokyo\"\n  }\n}\n👋 Goodbye!\n"
        );
    }

    #[test]
    fn test_estimated_usage_is_marked() {
        let text = render(&SessionEventKind::TokenUsage {
            usage: TokenUsage::estimate("one two three"),
        });
        assert_eq!(text, "💬 Tokens: prompt 4, completion ?, total 4 (estimated)");
    }
}

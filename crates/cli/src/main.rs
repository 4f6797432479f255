//! # Concierge
//!
//! Interactive terminal front end for the slot-filling task assistant.

mod console;
mod logging;

use anyhow::Context;
use clap::Parser;
use concierge_core::catalog::TaskCatalog;
use concierge_core::config::{AssistantConfig, ConfigOverrides, DEFAULT_CONFIG_PATH};
use concierge_core::session::Assistant;
use console::TerminalConsole;
use std::path::PathBuf;
use tokio::io::BufReader;

#[derive(Parser, Clone)]
#[command(author, version, about = "Concierge - conversational task assistant")]
struct Args {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "CONCIERGE_MODEL")]
    model: Option<String>,

    /// Folder of task documents (*.json)
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// API endpoint override
    #[arg(long)]
    base_url: Option<String>,

    /// JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            tasks_dir: self.tasks.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_logging();

    let args = Args::parse();

    let mut config = AssistantConfig::load_file(&args.config).await?;
    config.merge(args.overrides());

    let catalog = TaskCatalog::load(&config.tasks_dir)
        .with_context(|| format!("Failed to load tasks from {}", config.tasks_dir.display()))?;
    let model = config
        .model
        .create_llm()
        .context("Failed to create model client (set --api-key or GEMINI_API_KEY)")?;

    let mut console = TerminalConsole::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let mut assistant = Assistant::new(catalog, model);
    assistant.run(&mut console).await
}

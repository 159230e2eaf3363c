//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::source::SourceKind;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, kind: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let kind = kind
        .as_deref()
        .map(str::parse::<SourceKind>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Searching knowledge base...");

    match orchestrator.ask(question, kind).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            println!("\n{}\n", answer.text);

            if !answer.citations.is_empty() {
                Output::kv("Cited chunks", &answer.citations.len().to_string());
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

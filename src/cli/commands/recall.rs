//! Recall command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the recall command.
pub async fn run_recall(query: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Recalling...");

    match orchestrator.recall(query).await {
        Ok(results) => {
            spinner.finish_and_clear();
            if results.is_empty() {
                Output::info("Nothing relevant remembered.");
            } else {
                for result in &results {
                    Output::search_result(
                        &result.source_title,
                        "note",
                        result.score,
                        &result.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Recall failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

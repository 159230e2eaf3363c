//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: Option<usize>,
    min_score: Option<f32>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(limit) = limit {
        settings.retrieval.k = limit;
    }
    if let Some(min_score) = min_score {
        settings.retrieval.min_score = min_score;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Searching...");

    match orchestrator.search(query, None).await {
        Ok(results) => {
            spinner.finish_and_clear();
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for result in &results {
                    Output::search_result(
                        &result.source_title,
                        &result.kind.to_string(),
                        result.score,
                        &result.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let path = Path::new(path);

    let spinner = Output::spinner(&format!("Ingesting {}...", path.display()));
    match orchestrator.ingest_file(path).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success(&format!(
                "Indexed \"{}\" ({} chunks)",
                result.title, result.chunks_indexed
            ));
            Output::kv("Source ID", &result.source_id.to_string());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Remember command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use uuid::Uuid;

/// Run the remember command.
pub async fn run_remember(
    text: &str,
    title: Option<String>,
    tags: Vec<String>,
    supersedes: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let note = match supersedes {
        Some(old) => {
            let old_id = Uuid::parse_str(&old)
                .map_err(|_| anyhow::anyhow!("Invalid note ID: {}", old))?;
            orchestrator.supersede(old_id, title, text, tags).await?
        }
        None => orchestrator.remember(title, text, tags).await?,
    };

    Output::success(&format!("Remembered: {}", note.display_title()));
    Output::kv("Note ID", &note.id.to_string());
    if !note.tags.is_empty() {
        Output::kv("Tags", &note.tags.join(", "));
    }

    Ok(())
}

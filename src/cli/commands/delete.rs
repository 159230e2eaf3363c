//! Delete command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use uuid::Uuid;

/// Run the delete command.
pub async fn run_delete(source_id: &str, settings: Settings) -> Result<()> {
    let id = Uuid::parse_str(source_id)
        .map_err(|_| anyhow::anyhow!("Invalid source ID: {}", source_id))?;

    let orchestrator = Orchestrator::new(settings)?;
    let deleted = orchestrator.delete_source(id).await?;

    if deleted == 0 {
        Output::warning(&format!("No index entries found for {}", id));
    } else {
        Output::success(&format!("Deleted {} ({} chunks)", id, deleted));
    }

    Ok(())
}

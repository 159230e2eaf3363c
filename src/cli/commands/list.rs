//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;

/// Run the list command.
pub async fn run_list(notes: bool, all: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    if notes {
        let notes = orchestrator.list_notes(all).await?;
        if notes.is_empty() {
            Output::info("No notes yet. Use 'nova remember \"<text>\"' to add one.");
            return Ok(());
        }

        Output::header(&format!("Memory Notes ({})", notes.len()));
        println!();
        for note in &notes {
            let marker = if note.superseded_by.is_some() {
                format!(" {}", style("[superseded]").dim())
            } else {
                String::new()
            };
            Output::list_item(&format!(
                "{} ({}){}",
                style(note.display_title()).bold(),
                style(note.id).dim(),
                marker
            ));
        }
        return Ok(());
    }

    // Notes have their own view; only document sources are shown here.
    let sources = orchestrator
        .list_sources(Some(crate::vector_store::Partition::Documents))
        .await?;
    if sources.is_empty() {
        Output::info("No sources indexed yet. Use 'nova ingest <file>' to add content.");
        return Ok(());
    }

    Output::header(&format!("Indexed Sources ({})", sources.len()));
    println!();
    for source in &sources {
        Output::source_info(
            &source.title,
            &source.id.to_string(),
            &source.kind.to_string(),
            source.chunk_count,
        );
    }

    let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
    println!();
    Output::kv("Total sources", &sources.len().to_string());
    Output::kv("Total chunks", &total_chunks.to_string());

    Ok(())
}

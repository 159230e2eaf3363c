//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::lang::Language;
use crate::orchestrator::Orchestrator;
use crate::transcript::VideoSource;
use anyhow::Result;
use std::path::Path;

/// Run the summarize command.
pub async fn run_summarize(
    input: &str,
    language: Option<String>,
    index: bool,
    settings: Settings,
) -> Result<()> {
    let language = match language {
        Some(l) => Language::parse(&l)?,
        None => Language::parse(&settings.summarize.default_language)?,
    };

    // Text files get a plain text summary; everything else goes through
    // transcript extraction.
    let is_text_file = Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "txt" | "md" | "markdown"))
        .unwrap_or(false);

    if is_text_file {
        preflight_or_bail(Operation::SummarizeLocal)?;
        let orchestrator = Orchestrator::new(settings)?;
        let text = tokio::fs::read_to_string(input).await?;

        let spinner = Output::spinner(&format!("Summarizing in {}...", language));
        let summary = orchestrator.summarize_text(&text, language).await;
        spinner.finish_and_clear();

        println!("\n{}\n", summary?);
        return Ok(());
    }

    let source = VideoSource::parse(input)?;
    let operation = match source {
        VideoSource::YouTube { .. } => Operation::SummarizeYoutube,
        VideoSource::Local(_) => Operation::SummarizeLocal,
    };
    preflight_or_bail(operation)?;

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner(&format!("Summarizing in {}...", language));

    match orchestrator.summarize_video(input, language, index).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::header(&result.title);
            println!("\n{}\n", result.summary);
            if let Some(source_id) = result.indexed_source {
                Output::kv("Indexed as", &source_id.to_string());
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Summarization failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn preflight_or_bail(operation: Operation) -> Result<()> {
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'nova doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

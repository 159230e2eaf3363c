//! CLI module for Nova.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Nova - Personal Knowledge Assistant
///
/// Index your documents and notes, ask grounded questions, summarize
/// videos in your language, and keep searchable memory notes.
#[derive(Parser, Debug)]
#[command(name = "nova")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Nova and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Ingest a text or markdown file into the index
    Ingest {
        /// Path to the file to ingest
        path: String,
    },

    /// Ask a question answered from your indexed sources
    Ask {
        /// The question to ask
        question: String,

        /// Restrict to one source kind (file, url, note, transcript)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Search indexed sources without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Store a memory note
    Remember {
        /// The note text
        text: String,

        /// Optional short title
        #[arg(short, long)]
        title: Option<String>,

        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// ID of an existing note this one replaces
        #[arg(long)]
        supersedes: Option<String>,
    },

    /// Recall memory notes relevant to a query
    Recall {
        /// What to recall
        query: String,
    },

    /// Summarize a video or text file in a chosen language
    Summarize {
        /// YouTube URL/ID, local media file, or text file
        input: String,

        /// Output language (code or name, e.g. "ta" or "Tamil")
        #[arg(short, long)]
        language: Option<String>,

        /// Also index the transcript for later questions
        #[arg(long)]
        index: bool,
    },

    /// List indexed sources and memory notes
    List {
        /// Show memory notes instead of sources
        #[arg(long)]
        notes: bool,

        /// Include superseded notes
        #[arg(short, long)]
        all: bool,
    },

    /// Delete a source and all its index entries
    Delete {
        /// Source ID to delete
        source_id: String,
    },

    /// View or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Open the configuration file in $EDITOR
    Edit,
}

//! Nova - Personal Knowledge Assistant
//!
//! A local-first CLI tool for indexing documents, answering questions
//! grounded in your own sources, summarizing videos in your language, and
//! keeping searchable memory notes.
//!
//! # Overview
//!
//! Nova allows you to:
//! - Ingest text documents into a searchable vector index
//! - Ask questions answered only from your indexed sources, with citations
//! - Summarize YouTube videos and local media in ten supported languages
//! - Remember short notes and recall them later by meaning
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `chunking` - Overlapping character chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction (SQLite, in-memory)
//! - `rag` - Retrieval and grounded answering
//! - `transcript` - Transcript extraction (YouTube captions, Whisper)
//! - `summarize` - Summarization and translation
//! - `memory` - Append-only memory notes
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use nova::config::Settings;
//! use nova::orchestrator::Orchestrator;
//! use nova::source::SourceKind;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator
//!         .ingest_text(SourceKind::UploadedFile, "Notes", "Some text.", None)
//!         .await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     let answer = orchestrator.ask("What do my notes say?", None).await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod lang;
pub mod llm;
pub mod memory;
pub mod orchestrator;
pub mod provider;
pub mod rag;
pub mod retry;
pub mod source;
pub mod summarize;
pub mod transcript;
pub mod vector_store;

pub use error::{NovaError, Result};

//! Configuration module for Nova.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QaPrompts, SummarizePrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings, ProviderSettings,
    RetrievalSettings, Settings, SummarizeSettings, VectorStoreSettings,
};

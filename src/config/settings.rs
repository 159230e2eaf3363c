//! Configuration settings for Nova.

use crate::error::{NovaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub provider: ProviderSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub summarize: SummarizeSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.nova".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Shared provider settings: timeouts and retry behavior for remote calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum attempts for retryable failures.
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds, doubled each attempt.
    pub base_delay_ms: u64,
    /// LLM model for chat completions (answers, summaries).
    pub chat_model: String,
    /// Whisper model for local media transcription.
    pub whisper_model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_attempts: 3,
            base_delay_ms: 500,
            chat_model: "gpt-4o-mini".to_string(),
            whisper_model: "whisper-1".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Characters of overlap between consecutive chunks.
    pub overlap_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            overlap_chars: 200,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.nova/index.db".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks to retrieve per query.
    pub k: usize,
    /// Minimum cosine similarity for a chunk to count as relevant.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 6,
            min_score: 0.25,
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeSettings {
    /// Default output language code.
    pub default_language: String,
    /// Summary length ceiling as a fraction of the input length.
    pub ceiling_ratio: f32,
    /// Inputs shorter than this get a flat ceiling of this many characters
    /// instead of the fraction.
    pub ceiling_exempt_chars: usize,
    /// Number of timestamped highlights to request for videos.
    pub highlight_count: usize,
}

impl Default for SummarizeSettings {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            ceiling_ratio: 0.4,
            ceiling_exempt_chars: 400,
            highlight_count: 5,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| NovaError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.overlap_chars >= self.chunking.max_chars {
            return Err(NovaError::InvalidConfig(format!(
                "chunking.overlap_chars ({}) must be less than chunking.max_chars ({})",
                self.chunking.overlap_chars, self.chunking.max_chars
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(NovaError::InvalidConfig(
                "embedding.dimensions must be positive".to_string(),
            ));
        }
        if self.retrieval.k == 0 {
            return Err(NovaError::InvalidConfig(
                "retrieval.k must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(NovaError::InvalidConfig(format!(
                "retrieval.min_score ({}) must be between 0 and 1",
                self.retrieval.min_score
            )));
        }
        if !(0.0..=1.0).contains(&self.summarize.ceiling_ratio) {
            return Err(NovaError::InvalidConfig(format!(
                "summarize.ceiling_ratio ({}) must be between 0 and 1",
                self.summarize.ceiling_ratio
            )));
        }
        if self.provider.max_attempts == 0 {
            return Err(NovaError::InvalidConfig(
                "provider.max_attempts must be positive".to_string(),
            ));
        }
        crate::lang::Language::parse(&self.summarize.default_language)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nova")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Retry policy derived from the provider settings.
    pub fn retry_policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy {
            max_attempts: self.provider.max_attempts,
            base_delay_ms: self.provider.base_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut settings = Settings::default();
        settings.chunking.overlap_chars = settings.chunking.max_chars;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, NovaError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_bad_floor() {
        let mut settings = Settings::default();
        settings.retrieval.min_score = 1.5;
        assert!(matches!(
            settings.validate().unwrap_err(),
            NovaError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_language() {
        let mut settings = Settings::default();
        settings.summarize.default_language = "tlh".to_string();
        assert!(matches!(
            settings.validate().unwrap_err(),
            NovaError::UnsupportedLanguage(_)
        ));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = PathBuf::from("/no/such/nova-config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.retrieval.k, 6);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.retrieval.k = 12;
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(reloaded.retrieval.k, 12);
    }
}

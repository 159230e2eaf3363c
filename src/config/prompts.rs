//! Prompt templates for Nova.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory; anything not overridden falls back to the defaults here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub summarize: SummarizePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a careful assistant that answers questions using only the provided excerpts from the user's personal knowledge base.

Guidelines:
- Use only the numbered excerpts below; never rely on outside knowledge
- Refer to excerpts by their number, like [1] or [3], when you use them
- If the excerpts do not contain enough information to answer, reply exactly: "insufficient information"
- Be concise and direct"#
                .to_string(),

            user: r#"Question: {{question}}

Excerpts from the knowledge base:

{{context}}

Answer the question using only the excerpts above. If they are not enough, reply exactly "insufficient information"."#
                .to_string(),
        }
    }
}

/// Prompts for summarization and translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizePrompts {
    pub system: String,
    pub user: String,
    /// Stricter follow-up used when the first attempt came back in the
    /// wrong language.
    pub retry_user: String,
    /// Appended when timestamped highlights are wanted.
    pub highlights: String,
}

impl Default for SummarizePrompts {
    fn default() -> Self {
        Self {
            system: r#"You summarize content for a personal assistant. You always write in the language the user asks for, no matter what language the input is in."#
                .to_string(),

            user: r#"Summarize the following content in {{language}}. Write every sentence in {{language}}; do not use any other language. Keep the summary under {{max_chars}} characters.

Content:
{{content}}"#
                .to_string(),

            retry_user: r#"Your previous summary was not written in {{language}}. Rewrite it now, strictly and entirely in {{language}}. Output nothing except the summary itself, under {{max_chars}} characters.

Content:
{{content}}"#
                .to_string(),

            highlights: r#"

After the summary, add a "Highlights" section: the {{highlight_count}} most important moments, one per line, each starting with its timestamp in [MM:SS] form taken from the markers in the content."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, overridden by TOML files in a custom
    /// directory when one is configured.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let summarize_path = custom_path.join("summarize.toml");
            if summarize_path.exists() {
                let content = std::fs::read_to_string(&summarize_path)?;
                prompts.summarize = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template, substituting {{variable}} placeholders.
    /// Caller-provided variables take precedence over configured ones.
    pub fn render(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars.iter().chain(self.variables.iter()) {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

//! Supported languages and output-language validation.
//!
//! The summarizer promises its output entirely in the requested language,
//! so we need a way to check that promise without another provider call.
//! Detection here is deliberately cheap: Unicode script ranges identify the
//! Indic languages and Japanese outright, and small stopword lists separate
//! the Latin-script languages.

use crate::error::{NovaError, Result};
use serde::{Deserialize, Serialize};

/// Languages the summarizer/translator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Tamil,
    Telugu,
    Malayalam,
    Kannada,
    Hindi,
    French,
    Spanish,
    German,
    Japanese,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 10] = [
        Language::English,
        Language::Tamil,
        Language::Telugu,
        Language::Malayalam,
        Language::Kannada,
        Language::Hindi,
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Japanese,
    ];

    /// BCP-47 language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Malayalam => "ml",
            Language::Kannada => "kn",
            Language::Hindi => "hi",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
            Language::Japanese => "ja",
        }
    }

    /// English display name, as used in prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Malayalam => "Malayalam",
            Language::Kannada => "Kannada",
            Language::Hindi => "Hindi",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Japanese => "Japanese",
        }
    }

    /// Parse a language name or code, failing with `UnsupportedLanguage`.
    pub fn parse(input: &str) -> Result<Self> {
        let needle = input.trim().to_lowercase();
        Language::ALL
            .iter()
            .find(|l| l.code() == needle || l.name().to_lowercase() == needle)
            .copied()
            .ok_or_else(|| NovaError::UnsupportedLanguage(input.to_string()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Language {
    type Err = NovaError;

    fn from_str(s: &str) -> Result<Self> {
        Language::parse(s)
    }
}

/// Unicode script a character belongs to, for the scripts we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Tamil,
    Telugu,
    Malayalam,
    Kannada,
    Devanagari,
    Japanese,
    Other,
}

fn script_of(c: char) -> Script {
    match c as u32 {
        0x0041..=0x024F => Script::Latin,
        0x0900..=0x097F => Script::Devanagari,
        0x0B80..=0x0BFF => Script::Tamil,
        0x0C00..=0x0C7F => Script::Telugu,
        0x0C80..=0x0CFF => Script::Kannada,
        0x0D00..=0x0D7F => Script::Malayalam,
        // Hiragana, Katakana, and the CJK unified block Japanese text uses
        0x3040..=0x30FF | 0x4E00..=0x9FFF => Script::Japanese,
        _ => Script::Other,
    }
}

/// Detect the dominant language of a text, if it can be determined.
///
/// Script evidence wins for non-Latin languages. Latin-script text is
/// classified by stopword hits and falls back to English when nothing
/// distinctive is found.
pub fn detect(text: &str) -> Option<Language> {
    let mut counts = [0usize; 8];
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        counts[script_of(c) as usize] += 1;
    }

    let letters: usize = counts[..7].iter().sum();
    if letters == 0 {
        return None;
    }

    let dominant = (0..7).max_by_key(|&i| counts[i])?;
    // Require a clear majority so code-mixed output is not misclassified.
    if counts[dominant] * 2 < letters {
        return None;
    }

    match dominant {
        1 => Some(Language::Tamil),
        2 => Some(Language::Telugu),
        3 => Some(Language::Malayalam),
        4 => Some(Language::Kannada),
        5 => Some(Language::Hindi),
        6 => Some(Language::Japanese),
        _ => Some(detect_latin(text)),
    }
}

/// Distinguish the Latin-script languages by stopword frequency.
fn detect_latin(text: &str) -> Language {
    const FRENCH: &[&str] = &["le", "la", "les", "des", "une", "est", "dans", "pour", "avec", "sur", "cette"];
    const SPANISH: &[&str] = &["el", "los", "las", "una", "es", "en", "para", "con", "por", "este", "esta"];
    const GERMAN: &[&str] = &["der", "die", "das", "und", "ist", "ein", "eine", "mit", "nicht", "auf", "von"];
    const ENGLISH: &[&str] = &["the", "and", "is", "of", "to", "in", "that", "it", "for", "with", "this"];

    let mut scores = [(Language::French, 0usize), (Language::Spanish, 0), (Language::German, 0), (Language::English, 0)];
    for word in text.split(|c: char| !c.is_alphabetic()) {
        if word.is_empty() {
            continue;
        }
        let lower = word.to_lowercase();
        for (lang, score) in scores.iter_mut() {
            let list = match lang {
                Language::French => FRENCH,
                Language::Spanish => SPANISH,
                Language::German => GERMAN,
                _ => ENGLISH,
            };
            if list.contains(&lower.as_str()) {
                *score += 1;
            }
        }
    }

    scores
        .iter()
        .max_by_key(|(_, s)| *s)
        .map(|(l, _)| *l)
        .unwrap_or(Language::English)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!(Language::parse("French").unwrap(), Language::French);
        assert_eq!(Language::parse("fr").unwrap(), Language::French);
        assert_eq!(Language::parse("TAMIL").unwrap(), Language::Tamil);
        assert!(Language::parse("klingon").is_err());
    }

    #[test]
    fn test_detect_scripts() {
        assert_eq!(detect("இது ஒரு சோதனை வாக்கியம்"), Some(Language::Tamil));
        assert_eq!(detect("यह एक परीक्षण वाक्य है"), Some(Language::Hindi));
        assert_eq!(detect("これはテストの文章です"), Some(Language::Japanese));
        assert_eq!(detect("ಇದು ಒಂದು ಪರೀಕ್ಷಾ ವಾಕ್ಯ"), Some(Language::Kannada));
    }

    #[test]
    fn test_detect_latin_languages() {
        assert_eq!(
            detect("Le chat est dans la maison avec les enfants pour la nuit"),
            Some(Language::French)
        );
        assert_eq!(
            detect("Der Hund ist nicht mit der Katze und das ist ein Problem"),
            Some(Language::German)
        );
        assert_eq!(
            detect("The meeting is scheduled for the morning and it is important"),
            Some(Language::English)
        );
    }

    #[test]
    fn test_detect_empty() {
        assert_eq!(detect(""), None);
        assert_eq!(detect("12345 !!!"), None);
    }
}

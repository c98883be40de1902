use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

const DE: &str = include_str!("i18n/de.json");
const EN: &str = include_str!("i18n/en.json");

pub const FALLBACK_LOCALE: &str = "de";

#[derive(Debug, Error)]
#[error("translation table for '{locale}' is malformed: {source}")]
pub struct TranslationError {
    locale: String,
    source: serde_json::Error,
}

/// Flat key -> text table for one locale, picked once at startup.
#[derive(Debug, Clone)]
pub struct Translations {
    locale: String,
    texts: HashMap<String, String>,
}

impl Translations {
    /// Unknown locales fall back to German.
    pub fn load(locale: &str) -> Result<Self, TranslationError> {
        let (locale, source) = match locale {
            "de" => ("de", DE),
            "en" => ("en", EN),
            other => {
                warn!(locale = other, "unknown locale, using {}", FALLBACK_LOCALE);
                (FALLBACK_LOCALE, DE)
            }
        };
        let texts = serde_json::from_str(source).map_err(|source| TranslationError {
            locale: locale.to_string(),
            source,
        })?;
        Ok(Translations {
            locale: locale.to_string(),
            texts,
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The text for `key`, or the key itself when it is missing.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.texts.get(key).map(String::as_str).unwrap_or(key)
    }
}

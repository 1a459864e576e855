//! Message bundles: one flat `key -> text` JSON object per language.

use std::collections::HashMap;

use rust_embed::Embed;
use tracing::warn;

use crate::i18n::Language;

pub type Messages = HashMap<String, String>;

/// Source of per-language message tables.
pub trait ResourceBundle {
    /// Messages for `language`, or `None` when the bundle has none.
    fn messages(&self, language: Language) -> Option<Messages>;
}

#[derive(Embed)]
#[folder = "locales/"]
struct LocaleFiles;

/// Bundles compiled into the binary from `locales/<code>.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLocales;

impl ResourceBundle for EmbeddedLocales {
    fn messages(&self, language: Language) -> Option<Messages> {
        let name = format!("{}.json", language.code());
        let file = LocaleFiles::get(&name)?;
        match serde_json::from_slice(&file.data) {
            Ok(messages) => Some(messages),
            Err(e) => {
                warn!(file = %name, error = %e, "invalid locale bundle, ignoring it");
                None
            }
        }
    }
}

/// In-memory bundle for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    tables: HashMap<Language, Messages>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: Language, entries: &[(&str, &str)]) -> Self {
        let table = self.tables.entry(language).or_default();
        for (key, text) in entries {
            table.insert((*key).to_string(), (*text).to_string());
        }
        self
    }
}

impl ResourceBundle for MemoryBundle {
    fn messages(&self, language: Language) -> Option<Messages> {
        self.tables.get(&language).cloned()
    }
}

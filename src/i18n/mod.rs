//! Report localization.
//!
//! A [`Localizer`] is bound to one language at construction. Lookups never
//! fail: a key missing from the chosen language falls back to English, and
//! a key missing everywhere resolves to itself.

mod bundle;

use std::fmt::{self, Display};
use std::str::FromStr;

pub use bundle::{EmbeddedLocales, MemoryBundle, Messages, ResourceBundle};

/// Supported report languages, in environment detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Fr,
    En,
    Es,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Fr, Language::En, Language::Es, Language::De];

    /// Used when neither an explicit code nor the environment selects one.
    pub const DEFAULT: Language = Language::Fr;

    pub fn code(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
            Language::Es => "es",
            Language::De => "de",
        }
    }

    /// Explicit valid code, else the process environment, else French.
    pub fn select(explicit: Option<&str>) -> Language {
        Self::select_with(explicit, |name| std::env::var(name).ok())
    }

    /// Same as [`Language::select`] with an injectable environment lookup.
    pub fn select_with(explicit: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Language {
        explicit
            .and_then(|code| code.parse().ok())
            .or_else(|| detect_language(env))
            .unwrap_or(Self::DEFAULT)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| {
                format!(
                    "unsupported language '{s}' (available: {})",
                    available_languages().join(", ")
                )
            })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Language codes accepted by `--lang`.
pub fn available_languages() -> Vec<&'static str> {
    Language::ALL.iter().map(|l| l.code()).collect()
}

/// Guesses a language from `LANG`, `LC_ALL` and `LC_MESSAGES`, in that order.
///
/// Each non-empty value is lowercased and matched by substring against the
/// language codes in [`Language::ALL`] order; the first hit wins.
pub fn detect_language(env: impl Fn(&str) -> Option<String>) -> Option<Language> {
    ["LANG", "LC_ALL", "LC_MESSAGES"]
        .into_iter()
        .filter_map(|name| env(name))
        .filter(|value| !value.is_empty())
        .find_map(|value| {
            let value = value.to_lowercase();
            Language::ALL
                .into_iter()
                .find(|l| value.contains(l.code()))
        })
}

/// Key → text resolution for one language.
#[derive(Debug, Clone)]
pub struct Localizer {
    language: Language,
    messages: Messages,
    fallback: Messages,
}

impl Localizer {
    /// Localizer over the embedded locale bundles.
    pub fn new(language: Language) -> Self {
        Self::with_bundle(language, &EmbeddedLocales)
    }

    pub fn with_bundle(language: Language, bundle: &dyn ResourceBundle) -> Self {
        let messages = bundle.messages(language).unwrap_or_default();
        let fallback = if language == Language::En {
            Messages::new()
        } else {
            bundle.messages(Language::En).unwrap_or_default()
        };
        Self {
            language,
            messages,
            fallback,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Text for `key` without placeholders.
    pub fn text(&self, key: &str) -> String {
        self.resolve(key, &[])
    }

    /// Text for `key` with `{0}`, `{1}`, ... replaced by `args`.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn resolve(&self, key: &str, args: &[&dyn Display]) -> String {
        let template = self
            .messages
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key);
        substitute(template, args)
    }
}

fn substitute(template: &str, args: &[&dyn Display]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let arg = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|a| (a, close))
        });
        match arg {
            Some((value, close)) => {
                out.push_str(&value.to_string());
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

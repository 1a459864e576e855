//! Report rendering.
//!
//! A [`Renderer`] serializes one [`ReportSnapshot`] in one language. It only
//! formats what the snapshot already holds; nothing is re-derived per
//! format. Text and markdown build the whole document in memory and emit it
//! with a single write.

mod json;
mod markdown;
mod text;

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::fmt::{FmtStyle, format_duration};
use crate::i18n::Localizer;
use crate::model::ReportSnapshot;

pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;
pub use text::TextRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Renderer {
    fn render(&self, snapshot: &ReportSnapshot, out: &mut dyn Write) -> Result<(), RenderError>;

    /// Extension of files holding this format, without the dot.
    fn file_extension(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Text,
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Text,
        OutputFormat::Markdown,
        OutputFormat::Json,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unsupported format '{other}' (available: {})",
                available_formats().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical format names accepted by `--format`.
pub fn available_formats() -> Vec<&'static str> {
    OutputFormat::ALL.iter().map(|f| f.name()).collect()
}

pub fn renderer_for(format: OutputFormat, localizer: Localizer) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer::new(localizer)),
        OutputFormat::Markdown => Box::new(MarkdownRenderer::new(localizer)),
        OutputFormat::Json => Box::new(JsonRenderer::new(localizer)),
    }
}

// ============================================================
// Helpers shared by the document renderers
// ============================================================

fn yes_no(localizer: &Localizer, value: bool) -> String {
    localizer.text(if value { "yes" } else { "no" })
}

fn duration_label(localizer: &Localizer, secs: Option<f64>, style: FmtStyle) -> String {
    match secs {
        Some(s) => format_duration(s, style),
        None => localizer.text("unknown"),
    }
}

fn holder_list(ids: &BTreeSet<i32>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

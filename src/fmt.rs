//! Shared formatting helpers for the renderers.
//!
//! Pure string functions only; no localization happens here.

use chrono::{DateTime, TimeZone};

/// Maximum query length shown in text and markdown tables.
pub const QUERY_DISPLAY_WIDTH: usize = 120;

/// Controls compact (table cells) vs detail (prose lines) output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FmtStyle {
    /// Compact: no spaces (`"3m5s"`)
    Compact,
    /// Detail: spaces between units (`"3m 5s"`)
    Detail,
}

/// Format a duration in seconds as human-readable.
///
/// Below one minute keeps one decimal (`"3.2s"`); above, whole units only.
/// Negative or non-finite input renders as `"0s"`.
pub fn format_duration(secs: f64, style: FmtStyle) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "0s".to_string();
    }
    if secs < 60.0 {
        return format!("{:.1}s", secs);
    }

    let whole = secs as u64;
    let sep = match style {
        FmtStyle::Compact => "",
        FmtStyle::Detail => " ",
    };
    if whole < 3600 {
        format!("{}m{}{}s", whole / 60, sep, whole % 60)
    } else if whole < 86400 {
        format!("{}h{}{}m", whole / 3600, sep, (whole % 3600) / 60)
    } else {
        format!("{}d{}{}h", whole / 86400, sep, (whole % 86400) / 3600)
    }
}

/// Timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Collapses whitespace runs to single spaces and truncates to `max` chars.
pub fn truncate_query(query: &str, max: usize) -> String {
    let flat = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Makes a value safe for a markdown table cell.
pub fn escape_table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Wraps `value` in an inline code span whose fence is longer than any
/// backtick run inside it.
pub fn code_span(value: &str) -> String {
    let longest_run = value
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    if longest_run == 0 {
        return format!("`{value}`");
    }
    let fence = "`".repeat(longest_run + 1);
    format!("{fence} {value} {fence}")
}

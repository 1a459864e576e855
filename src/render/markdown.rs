use std::fmt::Write as _;
use std::io::Write;

use crate::fmt::{
    FmtStyle, QUERY_DISPLAY_WIDTH, code_span, escape_table_cell, format_timestamp, truncate_query,
};
use crate::i18n::Localizer;
use crate::model::ReportSnapshot;
use crate::render::{RenderError, Renderer, duration_label, holder_list, yes_no};

/// Markdown report: summary table, one table per non-empty section.
pub struct MarkdownRenderer {
    localizer: Localizer,
}

impl MarkdownRenderer {
    pub fn new(localizer: Localizer) -> Self {
        Self { localizer }
    }

    fn heading(&self, doc: &mut String, icon: &str, title_key: &str) {
        let _ = writeln!(doc, "## {} {}\n", icon, self.localizer.text(title_key));
    }

    /// Header row plus separator, columns given as localization keys.
    fn table_header(&self, doc: &mut String, columns: &[&str]) {
        let labels: Vec<String> = columns.iter().map(|c| self.localizer.text(c)).collect();
        let _ = writeln!(doc, "| {} |", labels.join(" | "));
        let rule: String = labels
            .iter()
            .map(|l| format!("{}|", "-".repeat(l.chars().count() + 2)))
            .collect();
        let _ = writeln!(doc, "|{rule}");
    }

    fn build(&self, s: &ReportSnapshot) -> String {
        let t = &self.localizer;
        let mut doc = String::new();

        // Header
        let _ = writeln!(doc, "# {}\n", t.text("report_title"));
        let _ = writeln!(
            doc,
            "**{}:** {}\n",
            t.text("generated_at"),
            format_timestamp(&s.captured_at)
        );

        // Summary
        self.heading(&mut doc, "📊", "summary_title");
        self.table_header(&mut doc, &["metric", "value"]);
        let summary = &s.summary;
        for (icon, key, value) in [
            ("🔒", "total_locks", summary.total_locks),
            ("⏳", "blocked_transactions", summary.blocked_count),
            ("⏰", "long_transactions", summary.long_count),
            ("💀", "deadlocks_detected", summary.deadlock_count),
            ("⚠️", "object_conflicts", summary.conflict_count),
            ("🚨", "critical_issues", summary.critical_issues),
            ("⚡", "warnings", summary.warnings),
            ("💡", "recommendations", summary.recommendation_count),
        ] {
            let _ = writeln!(doc, "| {} {} | {} |", icon, t.text(key), value);
        }
        doc.push('\n');

        if !s.locks.is_empty() {
            self.heading(&mut doc, "🔒", "active_locks");
            self.table_header(
                &mut doc,
                &[
                    "col_pid",
                    "col_mode",
                    "col_granted",
                    "col_type",
                    "col_object",
                    "col_page",
                    "col_tuple",
                ],
            );
            for lock in &s.locks {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} | {} | {} | {} | {} |",
                    lock.holder_id,
                    escape_table_cell(&lock.mode),
                    yes_no(t, lock.granted),
                    escape_table_cell(&lock.object_kind),
                    escape_table_cell(&lock.object_name),
                    lock.page.as_deref().unwrap_or(""),
                    lock.tuple.as_deref().unwrap_or("")
                );
            }
            doc.push('\n');
        }

        if !s.row_locks.is_empty() {
            self.heading(&mut doc, "🧱", "row_locks");
            self.table_header(
                &mut doc,
                &["col_pid", "col_table", "col_page", "col_tuple", "col_mode", "col_granted"],
            );
            for row in &s.row_locks {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} | {} | {} | {} |",
                    row.holder_id,
                    escape_table_cell(&row.table),
                    row.page,
                    row.tuple,
                    escape_table_cell(&row.mode),
                    yes_no(t, row.granted)
                );
            }
            doc.push('\n');
        }

        if !s.blocked_transactions.is_empty() {
            self.heading(&mut doc, "⏳", "blocked_transactions_section");
            self.table_header(&mut doc, &["col_pid", "col_duration", "col_wait_event", "col_query"]);
            for txn in &s.blocked_transactions {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} | {} |",
                    txn.holder_id,
                    duration_label(t, txn.duration_secs, FmtStyle::Compact),
                    escape_table_cell(&txn.wait_event),
                    code_span(&escape_table_cell(&truncate_query(
                        &txn.query,
                        QUERY_DISPLAY_WIDTH
                    )))
                );
            }
            doc.push('\n');
        }

        if !s.long_transactions.is_empty() {
            self.heading(&mut doc, "⏰", "long_transactions_section");
            self.table_header(&mut doc, &["col_pid", "col_duration", "col_query"]);
            for txn in &s.long_transactions {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} |",
                    txn.holder_id,
                    duration_label(t, Some(txn.duration_secs), FmtStyle::Compact),
                    code_span(&escape_table_cell(&truncate_query(
                        &txn.query,
                        QUERY_DISPLAY_WIDTH
                    )))
                );
            }
            doc.push('\n');
        }

        if !s.object_conflicts.is_empty() {
            self.heading(&mut doc, "⚠️", "object_conflicts_section");
            self.table_header(&mut doc, &["col_object", "col_holders", "col_recommendation"]);
            for conflict in &s.object_conflicts {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} |",
                    escape_table_cell(&conflict.object_name),
                    holder_list(&conflict.holder_ids),
                    t.text(conflict.recommendation)
                );
            }
            doc.push('\n');
        }

        if !s.deadlocks.is_empty() {
            self.heading(&mut doc, "💀", "deadlocks_section");
            self.table_header(
                &mut doc,
                &["col_object", "col_holder", "col_waiter", "col_recommendation"],
            );
            for candidate in &s.deadlocks {
                let (a, b) = (&candidate.record_a, &candidate.record_b);
                let _ = writeln!(
                    doc,
                    "| {} | {} ({}) | {} ({}) | {} |",
                    escape_table_cell(&a.object_name),
                    a.holder_id,
                    a.mode,
                    b.holder_id,
                    b.mode,
                    t.text(candidate.recommendation)
                );
            }
            doc.push('\n');
        }

        if !s.index_stats.is_empty() {
            self.heading(&mut doc, "📇", "indexes_section");
            self.table_header(&mut doc, &["col_index", "col_table", "col_size"]);
            for index in &s.index_stats {
                let _ = writeln!(
                    doc,
                    "| {} | {} | {} |",
                    escape_table_cell(&index.name),
                    escape_table_cell(&index.table),
                    index.size_label
                );
            }
            doc.push('\n');
        }

        if !s.suggestions.is_empty() {
            self.heading(&mut doc, "💡", "improvement_suggestions");
            for (i, suggestion) in s.suggestions.iter().enumerate() {
                let _ = writeln!(doc, "{}. {}\n", i + 1, t.text(suggestion.id));
            }
        }

        // Footer
        let _ = writeln!(doc, "---\n*{}*", t.text("report_footer"));

        doc
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, snapshot: &ReportSnapshot, out: &mut dyn Write) -> Result<(), RenderError> {
        out.write_all(self.build(snapshot).as_bytes())?;
        Ok(())
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }
}

use std::fmt::Write as _;
use std::io::Write;

use crate::fmt::{FmtStyle, QUERY_DISPLAY_WIDTH, format_timestamp, truncate_query};
use crate::i18n::Localizer;
use crate::model::ReportSnapshot;
use crate::render::{RenderError, Renderer, duration_label, holder_list, yes_no};

const BANNER_WIDTH: usize = 80;
const RULE_WIDTH: usize = 40;

/// Plain-text report with banner and dashed section rules.
pub struct TextRenderer {
    localizer: Localizer,
}

impl TextRenderer {
    pub fn new(localizer: Localizer) -> Self {
        Self { localizer }
    }

    fn section(&self, doc: &mut String, title_key: &str) {
        let _ = writeln!(doc, "{}", self.localizer.text(title_key).to_uppercase());
        let _ = writeln!(doc, "{}", "-".repeat(RULE_WIDTH));
    }

    fn build(&self, s: &ReportSnapshot) -> String {
        let t = &self.localizer;
        let mut doc = String::new();

        // Header
        let banner = "=".repeat(BANNER_WIDTH);
        let _ = writeln!(doc, "{banner}");
        let _ = writeln!(doc, "{}", t.text("report_title"));
        let _ = writeln!(doc, "{banner}");
        let _ = writeln!(
            doc,
            "{}: {}\n",
            t.text("generated_at"),
            format_timestamp(&s.captured_at)
        );

        // Summary
        self.section(&mut doc, "summary_title");
        let summary = &s.summary;
        for (key, value) in [
            ("total_locks", summary.total_locks),
            ("blocked_transactions", summary.blocked_count),
            ("long_transactions", summary.long_count),
            ("deadlocks_detected", summary.deadlock_count),
            ("object_conflicts", summary.conflict_count),
            ("critical_issues", summary.critical_issues),
            ("warnings", summary.warnings),
            ("recommendations", summary.recommendation_count),
        ] {
            let _ = writeln!(doc, "{}: {}", t.text(key), value);
        }
        doc.push('\n');

        if !s.locks.is_empty() {
            self.section(&mut doc, "active_locks");
            for lock in &s.locks {
                let _ = write!(
                    doc,
                    "{}: {}, {}: {}, {}: {}, {}: {}",
                    t.text("col_pid"),
                    lock.holder_id,
                    t.text("col_mode"),
                    lock.mode,
                    t.text("col_granted"),
                    yes_no(t, lock.granted),
                    t.text("col_type"),
                    lock.object_kind
                );
                if !lock.object_name.is_empty() {
                    let _ = write!(doc, ", {}: {}", t.text("col_object"), lock.object_name);
                }
                if let Some(page) = &lock.page {
                    let _ = write!(
                        doc,
                        ", {}: {}, {}: {}",
                        t.text("col_page"),
                        page,
                        t.text("col_tuple"),
                        lock.tuple.as_deref().unwrap_or("")
                    );
                }
                doc.push('\n');
            }
            doc.push('\n');
        }

        if !s.row_locks.is_empty() {
            self.section(&mut doc, "row_locks");
            for row in &s.row_locks {
                let _ = writeln!(
                    doc,
                    "{}: {}, {}: {}, {}: {}, {}: {}, {}: {}, {}: {}",
                    t.text("col_pid"),
                    row.holder_id,
                    t.text("col_table"),
                    row.table,
                    t.text("col_page"),
                    row.page,
                    t.text("col_tuple"),
                    row.tuple,
                    t.text("col_mode"),
                    row.mode,
                    t.text("col_granted"),
                    yes_no(t, row.granted)
                );
            }
            doc.push('\n');
        }

        if !s.blocked_transactions.is_empty() {
            self.section(&mut doc, "blocked_transactions_section");
            for txn in &s.blocked_transactions {
                let _ = writeln!(
                    doc,
                    "{}: {}, {}: {}, {}: {}, {}: {}",
                    t.text("col_pid"),
                    txn.holder_id,
                    t.text("col_duration"),
                    duration_label(t, txn.duration_secs, FmtStyle::Detail),
                    t.text("col_wait_event"),
                    txn.wait_event,
                    t.text("col_query"),
                    truncate_query(&txn.query, QUERY_DISPLAY_WIDTH)
                );
            }
            doc.push('\n');
        }

        if !s.long_transactions.is_empty() {
            self.section(&mut doc, "long_transactions_section");
            for txn in &s.long_transactions {
                let _ = writeln!(
                    doc,
                    "{}: {}, {}: {}, {}: {}",
                    t.text("col_pid"),
                    txn.holder_id,
                    t.text("col_duration"),
                    duration_label(t, Some(txn.duration_secs), FmtStyle::Detail),
                    t.text("col_query"),
                    truncate_query(&txn.query, QUERY_DISPLAY_WIDTH)
                );
            }
            doc.push('\n');
        }

        if !s.object_conflicts.is_empty() {
            self.section(&mut doc, "object_conflicts_section");
            for conflict in &s.object_conflicts {
                let _ = writeln!(
                    doc,
                    "{} ({}: {}), {}: {}",
                    t.resolve(
                        "holders_on_object",
                        &[&conflict.holder_ids.len(), &conflict.object_name]
                    ),
                    t.text("col_holders"),
                    holder_list(&conflict.holder_ids),
                    t.text("col_recommendation"),
                    t.text(conflict.recommendation)
                );
            }
            doc.push('\n');
        }

        if !s.deadlocks.is_empty() {
            self.section(&mut doc, "deadlocks_section");
            for candidate in &s.deadlocks {
                let (a, b) = (&candidate.record_a, &candidate.record_b);
                let _ = writeln!(
                    doc,
                    "{}: {}, {}: {} ({}), {}: {} ({}), {}: {}",
                    t.text("col_object"),
                    a.object_name,
                    t.text("col_holder"),
                    a.holder_id,
                    a.mode,
                    t.text("col_waiter"),
                    b.holder_id,
                    b.mode,
                    t.text("col_recommendation"),
                    t.text(candidate.recommendation)
                );
            }
            doc.push('\n');
        }

        if !s.index_stats.is_empty() {
            self.section(&mut doc, "indexes_section");
            for index in &s.index_stats {
                let _ = writeln!(
                    doc,
                    "{}: {}, {}: {}, {}: {}",
                    t.text("col_index"),
                    index.name,
                    t.text("col_table"),
                    index.table,
                    t.text("col_size"),
                    index.size_label
                );
            }
            doc.push('\n');
        }

        if !s.suggestions.is_empty() {
            self.section(&mut doc, "improvement_suggestions");
            for (i, suggestion) in s.suggestions.iter().enumerate() {
                let _ = writeln!(doc, "{}. {}", i + 1, t.text(suggestion.id));
            }
            doc.push('\n');
        }

        // Footer
        let _ = writeln!(doc, "{banner}");
        let _ = writeln!(doc, "{}", t.text("report_footer"));

        doc
    }
}

impl Renderer for TextRenderer {
    fn render(&self, snapshot: &ReportSnapshot, out: &mut dyn Write) -> Result<(), RenderError> {
        out.write_all(self.build(snapshot).as_bytes())?;
        Ok(())
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockSource;
    use crate::i18n::Language;
    use crate::render::tests::{empty_snapshot, render_to_string};
    use crate::report::generate_report;

    fn render(language: Language, snapshot: &ReportSnapshot) -> String {
        render_to_string(&TextRenderer::new(Localizer::new(language)), snapshot)
    }

    #[test]
    fn french_header_and_banner() {
        let out = render(Language::Fr, &empty_snapshot());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "RAPPORT D'ANALYSE DES LOCKS POSTGRESQL");
        assert_eq!(lines[2], "=".repeat(80));
        assert!(out.contains("Généré le: 2024-03-01 12:00:00"));
    }

    #[test]
    fn empty_snapshot_keeps_summary_and_omits_sections() {
        let out = render(Language::En, &empty_snapshot());
        assert!(out.contains("EXECUTIVE SUMMARY"));
        assert!(out.contains("Total active locks: 0"));
        assert!(!out.contains("ACTIVE LOCKS"));
        assert!(!out.contains("BLOCKED TRANSACTIONS\n"));
        assert!(!out.contains("DEADLOCK CANDIDATES"));
        assert!(!out.contains("IMPROVEMENT SUGGESTIONS"));
    }

    #[test]
    fn contention_sections_present() {
        let snapshot = generate_report(&mut MockSource::two_session_contention()).unwrap();
        let out = render(Language::En, &snapshot);
        assert!(out.contains("ACTIVE LOCKS"));
        assert!(out.contains(
            "PID: 1, Mode: ExclusiveLock, Granted: yes, Type: relation, Object: projects"
        ));
        assert!(out.contains("BLOCKED TRANSACTIONS"));
        assert!(out.contains("PID: 2, Duration: 3.2s, Wait event: relation"));
        assert!(out.contains("2 holders on projects"));
        assert!(out.contains("Holder: 1 (ExclusiveLock), Waiter: 2 (ShareLock)"));
        assert!(out.contains("1. Consider adding timeouts on long transactions"));
        assert!(out.contains("INDEXES"));
    }

    #[test]
    fn unknown_duration_is_localized() {
        let mut snapshot = empty_snapshot();
        snapshot.blocked_transactions.push(crate::model::BlockedTransaction {
            holder_id: 42,
            duration_secs: None,
            query: String::new(),
            wait_event: "lock".to_string(),
        });
        assert!(render(Language::Fr, &snapshot).contains("Durée: inconnue"));
        assert!(render(Language::En, &snapshot).contains("Duration: unknown"));
    }
}

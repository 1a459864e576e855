use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::i18n::Localizer;
use crate::model::ReportSnapshot;
use crate::render::{RenderError, Renderer};

/// Metadata label keys, emitted as `<key>_label`.
const LABEL_KEYS: &[&str] = &[
    "generated_at",
    "summary_title",
    "total_locks",
    "blocked_transactions",
    "long_transactions",
    "deadlocks_detected",
    "object_conflicts",
    "critical_issues",
    "warnings",
    "recommendations",
    "active_locks",
    "row_locks",
    "blocked_transactions_section",
    "long_transactions_section",
    "object_conflicts_section",
    "deadlocks_section",
    "indexes_section",
    "improvement_suggestions",
];

#[derive(Serialize)]
struct Document<'a> {
    metadata: Map<String, Value>,
    data: &'a ReportSnapshot,
}

/// Pretty-printed `{"metadata": {...}, "data": <snapshot>}`.
///
/// Suggestion ids stay raw in `data`; their localized texts are listed in
/// `metadata.suggestions` in the same order.
pub struct JsonRenderer {
    localizer: Localizer,
}

impl JsonRenderer {
    pub fn new(localizer: Localizer) -> Self {
        Self { localizer }
    }

    fn metadata(&self, snapshot: &ReportSnapshot) -> Map<String, Value> {
        let t = &self.localizer;
        let mut meta = Map::new();
        meta.insert("language".into(), t.language().code().into());
        meta.insert("report_title".into(), t.text("report_title").into());
        for key in LABEL_KEYS {
            meta.insert(format!("{key}_label"), t.text(key).into());
        }
        meta.insert("report_footer".into(), t.text("report_footer").into());
        meta.insert(
            "suggestions".into(),
            snapshot
                .suggestions
                .iter()
                .map(|s| Value::from(t.text(s.id)))
                .collect::<Vec<_>>()
                .into(),
        );
        meta
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, snapshot: &ReportSnapshot, out: &mut dyn Write) -> Result<(), RenderError> {
        let doc = Document {
            metadata: self.metadata(snapshot),
            data: snapshot,
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

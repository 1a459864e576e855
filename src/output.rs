//! Report destinations: stdout or files written atomically.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::model::ReportSnapshot;
use crate::render::{RenderError, Renderer};

/// Stem used when the output path has none.
const DEFAULT_STEM: &str = "lock_analysis";

/// Where a rendered report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    Stdout,
    File(PathBuf),
}

impl ReportTarget {
    /// `stdout` or `-` select standard output; anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "stdout" | "-" => ReportTarget::Stdout,
            path => ReportTarget::File(PathBuf::from(path)),
        }
    }
}

/// Renders into `<path>` through a `.tmp` sibling renamed on success.
///
/// A failed render removes the temporary file and leaves no report behind.
pub fn write_report_file(
    path: &Path,
    renderer: &dyn Renderer,
    snapshot: &ReportSnapshot,
) -> Result<(), RenderError> {
    let tmp_path = path.with_extension("tmp");

    if let Err(e) = render_into(&tmp_path, renderer, snapshot) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn render_into(
    path: &Path,
    renderer: &dyn Renderer,
    snapshot: &ReportSnapshot,
) -> Result<(), RenderError> {
    let mut file = fs::File::create(path)?;
    renderer.render(snapshot, &mut file)?;
    file.sync_all()?;
    Ok(())
}

/// File name for one monitoring tick: `<stem>_<YYYYmmdd_HHMMSS>_<NNN>.<ext>`,
/// in the directory of `base`.
pub fn tick_path(base: &Path, ext: &str, now: DateTime<Local>, counter: u64) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STEM);
    let name = format!(
        "{}_{}_{:03}.{}",
        stem,
        now.format("%Y%m%d_%H%M%S"),
        counter,
        ext
    );
    base.with_file_name(name)
}

/// Writes one report to a stream. Monitoring ticks are preceded by a
/// `--- Analysis #N (HH:MM:SS) ---` marker line.
pub fn write_stream_report(
    out: &mut dyn Write,
    renderer: &dyn Renderer,
    snapshot: &ReportSnapshot,
    tick: Option<u64>,
) -> Result<(), RenderError> {
    if let Some(n) = tick {
        writeln!(
            out,
            "--- Analysis #{} ({}) ---",
            n,
            snapshot.captured_at.format("%H:%M:%S")
        )?;
    }
    renderer.render(snapshot, out)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Writes one report to `target`. In monitoring mode (`tick` set) file
/// targets get a per-tick name. Returns the file written, if any.
pub fn emit(
    target: &ReportTarget,
    renderer: &dyn Renderer,
    snapshot: &ReportSnapshot,
    tick: Option<u64>,
) -> Result<Option<PathBuf>, RenderError> {
    match target {
        ReportTarget::Stdout => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_stream_report(&mut lock, renderer, snapshot, tick)?;
            Ok(None)
        }
        ReportTarget::File(base) => {
            let path = match tick {
                Some(n) => tick_path(base, renderer.file_extension(), snapshot.captured_at, n),
                None => base.clone(),
            };
            write_report_file(&path, renderer, snapshot)?;
            Ok(Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Language, Localizer};
    use crate::render::{OutputFormat, renderer_for};
    use chrono::TimeZone;

    fn snapshot() -> ReportSnapshot {
        ReportSnapshot::empty(Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap())
    }

    struct BrokenRenderer;

    impl Renderer for BrokenRenderer {
        fn render(&self, _: &ReportSnapshot, out: &mut dyn Write) -> Result<(), RenderError> {
            out.write_all(b"partial")?;
            Err(RenderError::Io(io::Error::other("boom")))
        }

        fn file_extension(&self) -> &'static str {
            "txt"
        }
    }

    #[test]
    fn target_from_arg() {
        assert_eq!(ReportTarget::from_arg("stdout"), ReportTarget::Stdout);
        assert_eq!(ReportTarget::from_arg("-"), ReportTarget::Stdout);
        assert_eq!(
            ReportTarget::from_arg("out/report.md"),
            ReportTarget::File(PathBuf::from("out/report.md"))
        );
    }

    #[test]
    fn writes_file_and_removes_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let renderer = renderer_for(OutputFormat::Markdown, Localizer::new(Language::En));

        write_report_file(&path, renderer.as_ref(), &snapshot()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# POSTGRESQL LOCK ANALYSIS REPORT"));
        assert!(!dir.path().join("report.tmp").exists());
    }

    #[test]
    fn failed_render_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        assert!(write_report_file(&path, &BrokenRenderer, &snapshot()).is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("report.tmp").exists());
    }

    #[test]
    fn tick_path_naming() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(
            tick_path(Path::new("/var/tmp/locks.md"), "md", now, 7),
            PathBuf::from("/var/tmp/locks_20240301_090507_007.md")
        );
        assert_eq!(
            tick_path(Path::new("report"), "json", now, 1234),
            PathBuf::from("report_20240301_090507_1234.json")
        );
    }

    #[test]
    fn emit_in_monitoring_mode_writes_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = ReportTarget::File(dir.path().join("locks.txt"));
        let renderer = renderer_for(OutputFormat::Text, Localizer::new(Language::Fr));

        let first = emit(&target, renderer.as_ref(), &snapshot(), Some(1)).unwrap().unwrap();
        let second = emit(&target, renderer.as_ref(), &snapshot(), Some(2)).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        assert!(!dir.path().join("locks.txt").exists());
    }

    #[test]
    fn stream_ticks_are_separated_by_markers() {
        let renderer = renderer_for(OutputFormat::Text, Localizer::new(Language::En));
        let mut out = Vec::new();
        write_stream_report(&mut out, renderer.as_ref(), &snapshot(), Some(1)).unwrap();
        write_stream_report(&mut out, renderer.as_ref(), &snapshot(), Some(2)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("--- Analysis #1 (09:05:07) ---\n"));
        assert!(text.contains("\n--- Analysis #2 (09:05:07) ---\n"));
    }

    #[test]
    fn single_stream_report_has_no_marker() {
        let renderer = renderer_for(OutputFormat::Markdown, Localizer::new(Language::En));
        let mut out = Vec::new();
        write_stream_report(&mut out, renderer.as_ref(), &snapshot(), None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# POSTGRESQL LOCK ANALYSIS REPORT"));
    }

    #[test]
    fn emit_single_report_uses_path_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let target = ReportTarget::File(path.clone());
        let renderer = renderer_for(OutputFormat::Json, Localizer::new(Language::En));

        let written = emit(&target, renderer.as_ref(), &snapshot(), None).unwrap();
        assert_eq!(written, Some(path.clone()));
        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["data"]["Summary"]["TotalLocks"], 0);
    }
}

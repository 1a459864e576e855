//! pglocks - PostgreSQL lock contention analyzer.
//!
//! Usage:
//!   pglocks                               # one markdown report to stdout
//!   pglocks -f json -o report.json        # one JSON report to a file
//!   pglocks -i 30 -o locks.md --lang en   # a new report file every 30 seconds
//!   pglocks --fixture captured.json       # analyze a captured state offline

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pglocks::collector::{
    ActivityFilter, CollectError, FixtureError, FixtureSource, LockSource, PostgresSource, SslMode,
};
use pglocks::i18n::{Language, Localizer, available_languages};
use pglocks::monitor::run_every;
use pglocks::output::{ReportTarget, emit};
use pglocks::render::{OutputFormat, RenderError, Renderer, available_formats, renderer_for};
use pglocks::report::{ReportError, generate_report};

/// PostgreSQL lock contention analyzer.
#[derive(Parser)]
#[command(name = "pglocks", about = "PostgreSQL lock contention analyzer", version)]
struct Args {
    /// Connection string (libpq key/value or postgres:// URL).
    /// Defaults to PGHOST, PGPORT, PGUSER, PGPASSWORD and PGDATABASE.
    #[arg(long, env = "PGLOCKS_DSN", hide_env_values = true)]
    dsn: Option<String>,

    /// Report format: text (txt), markdown (md) or json.
    #[arg(short, long, default_value = "markdown")]
    format: OutputFormat,

    /// Report language (fr, en, es, de). Detected from LANG/LC_ALL/LC_MESSAGES if omitted.
    #[arg(short, long)]
    lang: Option<String>,

    /// Output file, or "stdout". In monitoring mode each report gets its own
    /// timestamped file derived from this name.
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Monitoring interval in seconds. 0 produces a single report.
    #[arg(short, long, default_value_t = 0)]
    interval: u64,

    /// Statement timeout in seconds, also used as the connect timeout.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// TLS mode for the PostgreSQL connection (disable, require).
    #[arg(long, default_value = "disable")]
    sslmode: SslMode,

    /// Only collect sessions whose current query runs longer than this many seconds.
    #[arg(long, value_name = "SECONDS")]
    min_duration: Option<u64>,

    /// Only collect sessions that report a wait event.
    #[arg(long)]
    waiting_only: bool,

    /// Read lock state from a JSON capture instead of a live server.
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Print the supported report formats and exit.
    #[arg(long)]
    list_formats: bool,

    /// Print the supported report languages and exit.
    #[arg(long)]
    list_languages: bool,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Initializes the tracing subscriber on stderr; stdout carries only reports.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pglocks={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();

    if args.list_formats {
        for format in available_formats() {
            println!("{format}");
        }
        return;
    }
    if args.list_languages {
        for language in available_languages() {
            println!("{language}");
        }
        return;
    }

    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    if let Some(code) = args.lang.as_deref()
        && code.parse::<Language>().is_err()
    {
        warn!(lang = code, "unsupported language, detecting from environment");
    }
    let language = Language::select(args.lang.as_deref());
    debug!(%language, format = %args.format, output = %args.output, "report settings");

    let renderer = renderer_for(args.format, Localizer::new(language));
    let target = ReportTarget::from_arg(&args.output);
    let monitoring = args.interval > 0;
    let mut source = open_source(args, monitoring)?;

    if !monitoring {
        let snapshot = generate_report(source.as_mut())?;
        if let Some(path) = emit(&target, renderer.as_ref(), &snapshot, None)? {
            info!(path = %path.display(), "report written");
        }
        return Ok(());
    }

    monitor(args.interval, source.as_mut(), renderer.as_ref(), &target);
    Ok(())
}

fn open_source(args: &Args, monitoring: bool) -> Result<Box<dyn LockSource>, AppError> {
    if let Some(path) = &args.fixture {
        info!(path = %path.display(), "reading lock state from fixture");
        return Ok(Box::new(FixtureSource::open(path)?));
    }

    let source = match &args.dsn {
        Some(dsn) => PostgresSource::with_connection_string(dsn.clone()),
        None => PostgresSource::from_env()?,
    };
    let mut source = source
        .with_ssl_mode(args.sslmode)
        .with_statement_timeout(Duration::from_secs(args.timeout))
        .with_activity_filter(ActivityFilter {
            min_duration: args.min_duration.map(Duration::from_secs),
            waiting_only: args.waiting_only,
        });

    match source.try_connect() {
        Ok(()) => info!("connected to PostgreSQL"),
        // The monitoring loop reconnects on every tick.
        Err(e) if monitoring => warn!(error = %e, "initial connection failed"),
        Err(e) => return Err(e.into()),
    }
    Ok(Box::new(source))
}

fn monitor(
    interval_secs: u64,
    source: &mut dyn LockSource,
    renderer: &dyn Renderer,
    target: &ReportTarget,
) {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!(interval_secs, "monitoring started, press Ctrl-C to stop");

    let ticks = run_every(Duration::from_secs(interval_secs), &running, |tick| {
        match generate_report(&mut *source) {
            Ok(snapshot) => match emit(target, renderer, &snapshot, Some(tick)) {
                Ok(Some(path)) => info!(tick, path = %path.display(), "report written"),
                Ok(None) => {}
                Err(e) => error!(tick, error = %e, "failed to write report"),
            },
            Err(e) => error!(tick, error = %e, "failed to generate report"),
        }
    });

    info!(ticks, "monitoring stopped");
}

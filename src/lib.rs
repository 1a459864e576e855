//! pglocks - PostgreSQL lock contention analyzer.
//!
//! Samples `pg_locks` and `pg_stat_activity`, derives blocked and
//! long-running transactions, object conflicts and deadlock candidates, and
//! renders the findings as a localized text, markdown or JSON report.
//!
//! ```text
//! LockSource ─► collector::collect ─► report::assemble ─► render::Renderer
//!                                      │ analysis::analyze
//!                                      │ analysis::summary::summarize
//!                                      └ analysis::advisor::advise
//! ```

pub mod analysis;
pub mod collector;
pub mod fmt;
pub mod i18n;
pub mod model;
pub mod monitor;
pub mod output;
pub mod render;
pub mod report;

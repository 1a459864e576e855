//! SQL query builders for the PostgreSQL lock and activity views.
//!
//! Every query excludes the collector's own backend (`pg_backend_pid()`)
//! and only reads catalog views.

use std::time::Duration;

/// Lock table query.
///
/// Columns: pid, mode, granted, object_kind, object_name, page, tuple,
/// virtualxid, transactionid. Non-relation targets are named
/// `<locktype>:<id>` so a holder and a waiter on the same transaction id
/// share one object name. Relation names are resolved in the current
/// database only.
pub(super) fn build_locks_query() -> &'static str {
    r#"
        SELECT
            l.pid,
            l.mode,
            l.granted,
            CASE
                WHEN l.relation IS NOT NULL THEN 'relation'
                WHEN l.page IS NOT NULL THEN 'page'
                WHEN l.tuple IS NOT NULL THEN 'tuple'
                WHEN l.virtualxid IS NOT NULL THEN 'virtualxid'
                WHEN l.transactionid IS NOT NULL THEN 'transactionid'
                WHEN l.database IS NOT NULL THEN 'database'
                ELSE COALESCE(l.locktype, 'unknown')
            END as object_kind,
            COALESCE(
                t.relname,
                l.locktype || ':' || COALESCE(
                    l.transactionid::text, l.virtualxid, l.relation::text, ''
                )
            ) as object_name,
            l.page::text as page,
            l.tuple::text as tuple,
            l.virtualxid::text as virtualxid,
            l.transactionid::text as transactionid
        FROM pg_locks l
        LEFT JOIN pg_class t ON l.relation = t.oid
          AND (l.database IS NULL OR l.database = (SELECT oid FROM pg_database WHERE datname = current_database()))
        WHERE l.pid IS NOT NULL
          AND l.pid != pg_backend_pid()
        ORDER BY l.pid, l.mode
    "#
}

/// Row-level lock projection (locks that carry a page number).
pub(super) fn build_row_locks_query() -> &'static str {
    r#"
        SELECT
            l.pid,
            COALESCE(t.relname, '') as relname,
            COALESCE(l.page::text, '') as page,
            COALESCE(l.tuple::text, '') as tuple,
            l.mode,
            l.granted
        FROM pg_locks l
        LEFT JOIN pg_class t ON l.relation = t.oid
          AND (l.database IS NULL OR l.database = (SELECT oid FROM pg_database WHERE datname = current_database()))
        WHERE l.pid IS NOT NULL
          AND l.pid != pg_backend_pid()
          AND l.page IS NOT NULL
        ORDER BY l.pid
    "#
}

/// Optional narrowing of the active-session query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    /// Only sessions whose current query has run longer than this.
    pub min_duration: Option<Duration>,
    /// Only sessions that report a wait event.
    pub waiting_only: bool,
}

/// Active-session query, newest-longest first.
///
/// Columns: pid, duration_secs, query, wait_event_type, wait_event.
pub(super) fn build_activity_query(filter: ActivityFilter) -> String {
    let mut conditions = vec![
        "state = 'active'".to_string(),
        "pid != pg_backend_pid()".to_string(),
        "query_start IS NOT NULL".to_string(),
    ];
    if let Some(min) = filter.min_duration {
        conditions.push(format!(
            "now() - query_start > interval '{} milliseconds'",
            min.as_millis()
        ));
    }
    if filter.waiting_only {
        conditions.push("wait_event_type IS NOT NULL".to_string());
    }

    format!(
        r#"
            SELECT
                pid,
                EXTRACT(EPOCH FROM now() - query_start)::double precision as duration_secs,
                COALESCE(query, '') as query,
                wait_event_type,
                wait_event
            FROM pg_stat_activity
            WHERE {}
            ORDER BY duration_secs DESC
        "#,
        conditions.join("\n              AND ")
    )
}

/// Index catalog for the public schema, largest first.
pub(super) fn build_indexes_query() -> &'static str {
    r#"
        SELECT
            i.indexname,
            i.tablename,
            pg_size_pretty(pg_relation_size(c.oid)) as size
        FROM pg_indexes i
        JOIN pg_namespace n ON n.nspname = i.schemaname
        JOIN pg_class c ON c.relname = i.indexname AND c.relnamespace = n.oid
        WHERE i.schemaname = 'public'
        ORDER BY pg_relation_size(c.oid) DESC
    "#
}

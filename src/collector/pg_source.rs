//! PostgreSQL-backed lock source.
//!
//! Connects lazily and reconnects on the next call after any query error,
//! so a failed monitoring tick never poisons the following ones. Every
//! session runs with `statement_timeout` set, which bounds each tick.

use std::str::FromStr;
use std::time::Duration;

use native_tls::TlsConnector;
use postgres::{Client, Config, NoTls, Row};
use postgres_native_tls::MakeTlsConnector;
use tracing::{debug, warn};

use crate::collector::queries::{
    ActivityFilter, build_activity_query, build_indexes_query, build_locks_query,
    build_row_locks_query,
};
use crate::collector::{CollectError, LockSource};
use crate::model::{ActivitySample, IndexStat, LockRecord, RowLockRecord};

/// Default per-statement deadline.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(10);

const APPLICATION_NAME: &str = "pglocks";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    #[default]
    Disable,
    Require,
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "require" => Ok(SslMode::Require),
            other => Err(format!("unsupported sslmode '{other}' (expected disable|require)")),
        }
    }
}

/// Where connection parameters come from.
enum ConnectTarget {
    /// User-supplied libpq key/value string or URL, parsed on connect.
    Dsn(String),
    /// Parameters assembled from environment variables.
    Params(Config),
}

/// Lock source reading `pg_locks`, `pg_stat_activity` and `pg_indexes`.
///
/// Connects using standard environment variables when built with
/// [`PostgresSource::from_env`]:
/// - PGHOST (default: localhost)
/// - PGPORT (default: 5432)
/// - PGUSER (default: $USER)
/// - PGPASSWORD (default: empty)
/// - PGDATABASE (default: same as PGUSER)
pub struct PostgresSource {
    target: ConnectTarget,
    ssl_mode: SslMode,
    statement_timeout: Duration,
    activity_filter: ActivityFilter,
    client: Option<Client>,
    last_error: Option<String>,
}

impl PostgresSource {
    /// Creates a source from libpq environment variables.
    ///
    /// Uses $USER as default if PGUSER is not set.
    pub fn from_env() -> Result<Self, CollectError> {
        let user = std::env::var("PGUSER")
            .or_else(|_| std::env::var("USER"))
            .map_err(|_| CollectError::EnvNotSet("PGUSER or USER".to_string()))?;

        let host = std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
        let password = std::env::var("PGPASSWORD").unwrap_or_default();
        let database = std::env::var("PGDATABASE").unwrap_or_else(|_| user.clone());

        let config = build_config(&host, &port, &user, &password, &database)?;
        Ok(Self::new(ConnectTarget::Params(config)))
    }

    /// Creates a source from a libpq key/value string or a `postgres://` URL.
    pub fn with_connection_string(connection_string: impl Into<String>) -> Self {
        Self::new(ConnectTarget::Dsn(connection_string.into()))
    }

    fn new(target: ConnectTarget) -> Self {
        Self {
            target,
            ssl_mode: SslMode::default(),
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            activity_filter: ActivityFilter::default(),
            client: None,
            last_error: None,
        }
    }

    pub fn with_ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    /// Sets the deadline applied to the connection attempt and to every statement.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Narrows the active-session query. The default collects every active session.
    pub fn with_activity_filter(mut self, filter: ActivityFilter) -> Self {
        self.activity_filter = filter;
        self
    }

    /// Attempts to connect, for startup checks before the first report.
    pub fn try_connect(&mut self) -> Result<(), CollectError> {
        self.ensure_connected().map(|_| ())
    }

    /// Returns the last error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn ensure_connected(&mut self) -> Result<&mut Client, CollectError> {
        if self.client.is_none() {
            match self.connect() {
                Ok(client) => {
                    debug!(ssl_mode = ?self.ssl_mode, "connected to PostgreSQL");
                    self.client = Some(client);
                    self.last_error = None;
                }
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    return Err(e);
                }
            }
        }
        self.client
            .as_mut()
            .ok_or_else(|| CollectError::Connection("not connected".to_string()))
    }

    fn connect(&self) -> Result<Client, CollectError> {
        let mut config = match &self.target {
            ConnectTarget::Dsn(dsn) => dsn.parse::<Config>().map_err(|e| {
                CollectError::Connection(format_postgres_error(&e))
            })?,
            ConnectTarget::Params(config) => config.clone(),
        };
        config.application_name(APPLICATION_NAME);
        if config.get_connect_timeout().is_none() {
            config.connect_timeout(self.statement_timeout);
        }

        let mut client = match self.ssl_mode {
            SslMode::Disable => config.connect(NoTls),
            SslMode::Require => {
                let connector =
                    TlsConnector::new().map_err(|e| CollectError::Tls(e.to_string()))?;
                config.connect(MakeTlsConnector::new(connector))
            }
        }
        .map_err(|e| CollectError::Connection(format_postgres_error(&e)))?;

        client
            .batch_execute(&session_setup_sql(self.statement_timeout))
            .map_err(|e| CollectError::Connection(format_postgres_error(&e)))?;

        Ok(client)
    }

    /// Runs one query; on failure drops the connection so the next call reconnects.
    fn run_query(&mut self, name: &'static str, sql: &str) -> Result<Vec<Row>, CollectError> {
        let client = self.ensure_connected()?;
        match client.query(sql, &[]) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                let message = format_postgres_error(&e);
                warn!(query = name, error = %message, "query failed, dropping connection");
                self.last_error = Some(message.clone());
                self.client = None;
                Err(CollectError::Query {
                    query: name,
                    message,
                })
            }
        }
    }
}

impl LockSource for PostgresSource {
    fn locks(&mut self) -> Result<Vec<LockRecord>, CollectError> {
        let rows = self.run_query("locks", build_locks_query())?;
        Ok(rows.iter().filter_map(parse_lock_row).collect())
    }

    fn row_locks(&mut self) -> Result<Vec<RowLockRecord>, CollectError> {
        let rows = self.run_query("row_locks", build_row_locks_query())?;
        Ok(rows.iter().filter_map(parse_row_lock_row).collect())
    }

    fn activity(&mut self) -> Result<Vec<ActivitySample>, CollectError> {
        let query = build_activity_query(self.activity_filter);
        let rows = self.run_query("activity", &query)?;
        Ok(rows.iter().filter_map(parse_activity_row).collect())
    }

    fn indexes(&mut self) -> Result<Vec<IndexStat>, CollectError> {
        let rows = self.run_query("indexes", build_indexes_query())?;
        Ok(rows.iter().filter_map(parse_index_row).collect())
    }
}

/// Safely parses a single `pg_locks` row.
/// Returns None if critical columns fail to deserialize.
fn parse_lock_row(row: &Row) -> Option<LockRecord> {
    Some(LockRecord {
        holder_id: row.try_get(0).ok()?,
        mode: row.try_get(1).ok()?,
        granted: row.try_get(2).ok()?,
        object_kind: row.try_get(3).unwrap_or_default(),
        object_name: row.try_get(4).unwrap_or_default(),
        page: row.try_get(5).ok().flatten(),
        tuple: row.try_get(6).ok().flatten(),
        virtual_xid: row.try_get(7).ok().flatten(),
        transaction_id: row.try_get(8).ok().flatten(),
    })
}

fn parse_row_lock_row(row: &Row) -> Option<RowLockRecord> {
    Some(RowLockRecord {
        holder_id: row.try_get(0).ok()?,
        table: row.try_get(1).unwrap_or_default(),
        page: row.try_get(2).unwrap_or_default(),
        tuple: row.try_get(3).unwrap_or_default(),
        mode: row.try_get(4).ok()?,
        granted: row.try_get(5).ok()?,
    })
}

fn parse_activity_row(row: &Row) -> Option<ActivitySample> {
    Some(ActivitySample {
        holder_id: row.try_get(0).ok()?,
        duration_secs: row
            .try_get::<_, Option<f64>>(1)
            .ok()
            .flatten()
            .unwrap_or(0.0),
        query: row.try_get(2).unwrap_or_default(),
        wait_event_type: row.try_get(3).ok().flatten(),
        wait_event: row.try_get(4).ok().flatten(),
    })
}

fn parse_index_row(row: &Row) -> Option<IndexStat> {
    Some(IndexStat {
        name: row.try_get(0).ok()?,
        table: row.try_get(1).ok()?,
        size_label: row.try_get::<_, Option<String>>(2).ok().flatten().unwrap_or_default(),
    })
}

/// Builds connection parameters field by field, so values need no quoting.
fn build_config(
    host: &str,
    port: &str,
    user: &str,
    password: &str,
    database: &str,
) -> Result<Config, CollectError> {
    let port: u16 = port
        .parse()
        .map_err(|_| CollectError::Connection(format!("invalid PGPORT '{port}'")))?;

    let mut config = Config::new();
    config.host(host).port(port).user(user).dbname(database);
    if !password.is_empty() {
        config.password(password);
    }
    Ok(config)
}

/// Session settings applied right after connecting.
fn session_setup_sql(statement_timeout: Duration) -> String {
    format!(
        "SET statement_timeout = {}; SET default_transaction_read_only = on;",
        statement_timeout.as_millis()
    )
}

/// Formats PostgreSQL error message for display.
fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else if msg.contains("does not exist") {
            msg.split("FATAL:")
                .last()
                .unwrap_or(&msg)
                .trim()
                .to_string()
        } else {
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_omits_empty_password() {
        let config = build_config("localhost", "5432", "app", "", "app").unwrap();
        assert_eq!(config.get_password(), None);
        assert_eq!(config.get_user(), Some("app"));
        assert_eq!(config.get_dbname(), Some("app"));
        assert_eq!(config.get_ports(), &[5432]);
    }

    #[test]
    fn config_keeps_special_characters_verbatim() {
        let config = build_config("db", "6432", "app user", "p w'x\\", "my db").unwrap();
        assert_eq!(config.get_password(), Some(&b"p w'x\\"[..]));
        assert_eq!(config.get_user(), Some("app user"));
        assert_eq!(config.get_dbname(), Some("my db"));
    }

    #[test]
    fn config_rejects_non_numeric_port() {
        let err = build_config("db", "pg", "app", "", "app").unwrap_err();
        assert!(matches!(err, CollectError::Connection(_)));
    }

    #[test]
    fn session_setup_sets_timeout_in_millis() {
        let sql = session_setup_sql(Duration::from_secs(3));
        assert!(sql.contains("statement_timeout = 3000"));
        assert!(sql.contains("default_transaction_read_only = on"));
    }

    #[test]
    fn ssl_mode_parses_case_insensitively() {
        assert_eq!("REQUIRE".parse::<SslMode>(), Ok(SslMode::Require));
        assert_eq!("disable".parse::<SslMode>(), Ok(SslMode::Disable));
        assert!("verify-full".parse::<SslMode>().is_err());
    }

    #[test]
    fn unreachable_server_reports_connection_error() {
        let mut source =
            PostgresSource::with_connection_string("host=127.0.0.1 port=1 user=nobody dbname=x")
                .with_statement_timeout(Duration::from_millis(200));
        let err = source.locks().unwrap_err();
        assert!(matches!(err, CollectError::Connection(_)));
        assert!(source.last_error().is_some());
    }
}

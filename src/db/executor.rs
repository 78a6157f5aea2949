//! Resilient query executor
//!
//! Every SQL statement in the system goes through [`QueryExecutor`], which
//! wraps a single execution with:
//!
//! - a per-attempt statement timeout, so one slow query cannot hold a
//!   connection indefinitely;
//! - a bounded retry with linear backoff for failures classified as
//!   transient.
//!
//! Transient classification is structural: [`QueryErrorKind`] is a closed
//! enum derived from the driver error, never from matching message text.
//! Non-transient errors (constraint violations, decode errors, bad SQL)
//! propagate to the caller on the first attempt.
//!
//! The executor holds the pool it was constructed with; tests substitute an
//! in-memory pool.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::query::Query;
use sqlx::Sqlite;
use std::future::Future;
use std::time::Duration;

use crate::config::QueryConfig;

/// A dynamically typed value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Integer(v)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Integer(v as i64)
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Real(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Bool(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(v: DateTime<Utc>) -> Self {
        BindValue::Timestamp(v)
    }
}

impl From<NaiveDate> for BindValue {
    fn from(v: NaiveDate) -> Self {
        BindValue::Date(v)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => BindValue::Null,
        }
    }
}

/// Closed classification of query failures.
///
/// The transient kinds are the ones worth retrying: the connection (or the
/// pool behind it) failed, not the statement itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// The connection dropped mid-flight (IO or protocol failure)
    ConnectionLost,
    /// No connection became available within the pool's acquire timeout
    PoolTimedOut,
    /// The pool has been shut down
    PoolClosed,
    /// TLS-layer failure
    Tls,
    /// The per-attempt statement timeout elapsed
    StatementTimeout,
    /// Constraint violation (unique, foreign key, not null, check)
    Constraint,
    /// Any other error reported by the database engine
    Database,
    /// Row/column decoding failed
    Decode,
    /// No row where exactly one was required
    NotFound,
    /// Driver configuration or usage error
    Other,
}

impl QueryErrorKind {
    /// Whether a failure of this kind is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryErrorKind::ConnectionLost
                | QueryErrorKind::PoolTimedOut
                | QueryErrorKind::PoolClosed
                | QueryErrorKind::Tls
                | QueryErrorKind::StatementTimeout
        )
    }
}

/// Error returned by the query executor.
#[derive(Debug, thiserror::Error)]
#[error("query failed ({kind:?}): {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    message: String,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn timed_out(limit: Duration) -> Self {
        Self::new(
            QueryErrorKind::StatementTimeout,
            format!("statement exceeded {}ms", limit.as_millis()),
        )
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(e: sqlx::Error) -> Self {
        let kind = match &e {
            sqlx::Error::Io(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed => {
                QueryErrorKind::ConnectionLost
            }
            sqlx::Error::PoolTimedOut => QueryErrorKind::PoolTimedOut,
            sqlx::Error::PoolClosed => QueryErrorKind::PoolClosed,
            sqlx::Error::Tls(_) => QueryErrorKind::Tls,
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => QueryErrorKind::Constraint,
                _ => QueryErrorKind::Database,
            },
            sqlx::Error::RowNotFound => QueryErrorKind::NotFound,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => QueryErrorKind::Decode,
            _ => QueryErrorKind::Other,
        };
        Self::new(kind, e.to_string())
    }
}

/// Result metadata for a mutating statement.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteResult {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// Timeout and retry knobs for the executor.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub retries: u32,
    /// Base backoff; the wait before attempt k+1 is `backoff * k`
    pub backoff: Duration,
    /// Per-attempt statement timeout
    pub statement_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(300),
            statement_timeout: Duration::from_millis(8_000),
        }
    }
}

impl From<&QueryConfig> for RetryPolicy {
    fn from(config: &QueryConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
            statement_timeout: Duration::from_millis(config.statement_timeout_ms),
        }
    }
}

/// Executes parameterized SQL against the pool with timeout and retry.
#[derive(Clone)]
pub struct QueryExecutor {
    pool: SqlitePool,
    policy: RetryPolicy,
}

impl QueryExecutor {
    /// Create an executor over the given pool.
    pub fn new(pool: SqlitePool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    /// Create an executor with the default policy (for tests and tools).
    pub fn with_defaults(pool: SqlitePool) -> Self {
        Self::new(pool, RetryPolicy::default())
    }

    /// The underlying pool (migrations run against it directly).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch all rows for a query.
    pub async fn fetch_all(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Vec<SqliteRow>, QueryError> {
        self.run_with_retry(|_| async {
            self.with_timeout(bind_params(sqlx::query(sql), params).fetch_all(&self.pool))
                .await
        })
        .await
    }

    /// Fetch at most one row.
    pub async fn fetch_optional(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Option<SqliteRow>, QueryError> {
        self.run_with_retry(|_| async {
            self.with_timeout(bind_params(sqlx::query(sql), params).fetch_optional(&self.pool))
                .await
        })
        .await
    }

    /// Fetch exactly one row.
    pub async fn fetch_one(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<SqliteRow, QueryError> {
        self.run_with_retry(|_| async {
            self.with_timeout(bind_params(sqlx::query(sql), params).fetch_one(&self.pool))
                .await
        })
        .await
    }

    /// Run a mutating statement, returning affected-row metadata unchanged.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<ExecuteResult, QueryError> {
        self.run_with_retry(|_| async {
            let result = self
                .with_timeout(bind_params(sqlx::query(sql), params).execute(&self.pool))
                .await?;
            Ok(ExecuteResult {
                rows_affected: result.rows_affected(),
                last_insert_id: result.last_insert_rowid(),
            })
        })
        .await
    }

    /// Retry loop shared by all query paths.
    ///
    /// `op` receives the 1-based attempt number. Transient failures are
    /// retried up to the budget with a wait of `backoff * attempt` between
    /// attempts; anything else fails immediately with the last error.
    pub async fn run_with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, QueryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let mut attempt = 1u32;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt <= self.policy.retries => {
                    let delay = self.policy.backoff * attempt;
                    tracing::warn!(
                        attempt,
                        budget = self.policy.retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying query after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Bound a single attempt with the statement timeout.
    ///
    /// Applied inside the retry loop so every attempt, including retries,
    /// gets a fresh timeout.
    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, QueryError> {
        match tokio::time::timeout(self.policy.statement_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(QueryError::timed_out(self.policy.statement_timeout)),
        }
    }
}

/// Bind dynamic values to positional `?` placeholders.
fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            BindValue::Null => query.bind(None::<i64>),
            BindValue::Integer(v) => query.bind(*v),
            BindValue::Real(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.as_str()),
            BindValue::Bool(v) => query.bind(*v),
            BindValue::Timestamp(v) => query.bind(*v),
            BindValue::Date(v) => query.bind(*v),
        };
    }
    query
}

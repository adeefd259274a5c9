//! Application error management.
//!
//! Every failure the core surfaces is an [`AppError`]. Store and cache
//! client errors are translated once, at the conversion boundary, into the
//! small set of domain variants repositories are allowed to see.

use thiserror::Error;
use tracing::{error, info, warn};

/// Common application error definition.
///
/// Covers the store, cache, transaction, and configuration failure modes of
/// the data-access core.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    // Store errors
    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    #[error("Database query failed: {0}")]
    DatabaseQuery(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // Cache errors - never escalated past the cache adapter
    #[error("Redis connection failed: {0}")]
    RedisConnection(String),

    #[error("Redis error: {0}")]
    RedisError(String),

    // Input and lifecycle errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Error severity levels, used to pick the logging level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Transient MySQL error codes: serialization failure, deadlock, lock wait
/// timeout, too many connections.
const RETRYABLE_CODES: [&str; 4] = ["40001", "1213", "1205", "1040"];

/// Message fragments that indicate a transient network or timeout condition.
const RETRYABLE_KEYWORDS: [&str; 6] = [
    "deadlock",
    "serialization",
    "lock wait timeout",
    "timed out",
    "connection",
    "network",
];

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::DatabaseConnection(_) | AppError::RedisConnection(_) => {
                ErrorSeverity::Critical
            }

            AppError::DatabaseQuery(_)
            | AppError::TransactionFailed(_)
            | AppError::Timeout(_)
            | AppError::InternalError(_)
            | AppError::Configuration(_) => ErrorSeverity::High,

            AppError::InvalidInput(_)
            | AppError::Serialization(_)
            | AppError::ForeignKeyViolation(_) => ErrorSeverity::Medium,

            AppError::DuplicateEntry(_) | AppError::NotFound(_) | AppError::RedisError(_) => {
                ErrorSeverity::Low
            }
        }
    }

    /// Logs the error at the level its severity calls for.
    pub fn log(&self, context: &str) {
        let message = self.to_string();
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!("[{:?}] {} - {}", self.severity(), context, message);
            }
            ErrorSeverity::Medium => {
                warn!("[Medium] {} - {}", context, message);
            }
            ErrorSeverity::Low => {
                info!("[Low] {} - {}", context, message);
            }
        }
    }

    /// Whether the failure is transient and safe to retry.
    ///
    /// Connection and timeout variants are always retryable; query and
    /// transaction failures are retryable when they carry one of the
    /// transient MySQL codes or a timeout/network message family.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Timeout(_)
            | AppError::DatabaseConnection(_)
            | AppError::RedisConnection(_) => true,

            AppError::DatabaseQuery(msg) | AppError::TransactionFailed(msg) => {
                let lower = msg.to_lowercase();
                RETRYABLE_CODES.iter().any(|code| msg.contains(code))
                    || RETRYABLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
            }

            _ => false,
        }
    }

    /// Whether the error came from the cache tier. Cache failures degrade
    /// to fallback or pass-through, never abort the caller's operation.
    pub fn is_cache_unavailable(&self) -> bool {
        matches!(self, AppError::RedisConnection(_) | AppError::RedisError(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("database record not found".into()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
                match code.as_str() {
                    // MySQL duplicate key
                    "23000" | "1062" => AppError::DuplicateEntry(db_err.to_string()),
                    // MySQL FK violations (insert/update and delete direction)
                    "1452" | "1451" => AppError::ForeignKeyViolation(db_err.to_string()),
                    _ => AppError::DatabaseQuery(format!("({}) {}", code, db_err)),
                }
            }
            sqlx::Error::PoolTimedOut => {
                AppError::Timeout("database connection pool timeout".into())
            }
            sqlx::Error::PoolClosed => AppError::DatabaseConnection("database pool is closed".into()),
            sqlx::Error::Io(e) => AppError::DatabaseConnection(e.to_string()),
            sqlx::Error::Configuration(e) => AppError::Configuration(e.to_string()),
            _ => AppError::DatabaseQuery(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_io_error() || err.is_timeout() {
            AppError::RedisConnection(err.to_string())
        } else {
            AppError::RedisError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

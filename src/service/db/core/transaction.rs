//! Transaction execution with retry.
//!
//! Wraps multi-statement units of work in a transaction at the policy's
//! isolation level and retries transient failures with exponential backoff.
//! The executor has no knowledge of what the unit of work does.

use sqlx::{MySql, Transaction};
use std::future::Future;
use std::pin::Pin;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::config::db::DbConnection;
use crate::service::db::retry::RetryPolicy;
use crate::tool::error::AppError;

/// Boxed future type for transactional units of work; the lifetime is the
/// borrow of the transaction handle.
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>;

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

pub struct TransactionExecutor {
    pool: DbConnection,
}

impl TransactionExecutor {
    pub fn new(pool: DbConnection) -> Self {
        Self { pool }
    }

    /// Runs the unit of work inside a transaction, retrying per the policy.
    ///
    /// Each attempt acquires a transaction within `acquire_timeout`, sets
    /// the isolation level, runs the closure, and commits or rolls back.
    /// The whole loop is bounded by the policy's total timeout.
    pub async fn execute<T, F>(&self, policy: &RetryPolicy, operation: F) -> Result<T, AppError>
    where
        F: for<'c> Fn(&'c mut Transaction<'static, MySql>) -> TxFuture<'c, T> + Send + Sync,
        T: Send,
    {
        policy
            .run(|attempt| self.attempt(policy, &operation, attempt))
            .await
    }

    async fn attempt<T, F>(
        &self,
        policy: &RetryPolicy,
        operation: &F,
        attempt: u32,
    ) -> Result<T, AppError>
    where
        F: for<'c> Fn(&'c mut Transaction<'static, MySql>) -> TxFuture<'c, T> + Send + Sync,
        T: Send,
    {
        let mut tx = timeout(policy.acquire_timeout, self.pool.begin())
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "transaction acquire timed out after {:?}",
                    policy.acquire_timeout
                ))
            })?
            .map_err(|e| AppError::DatabaseConnection(format!("transaction start failed: {e}")))?;

        let isolation_sql = format!(
            "SET TRANSACTION ISOLATION LEVEL {}",
            policy.isolation.as_str()
        );
        sqlx::query(&isolation_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseQuery(format!("failed to set isolation level: {e}")))?;

        debug!(attempt, isolation = policy.isolation.as_str(), "transaction started");

        match operation(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|e| {
                    error!("transaction commit failed: {e}");
                    AppError::DatabaseConnection(format!("transaction commit failed: {e}"))
                })?;
                debug!(attempt, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("transaction rollback failed: {rollback_err}");
                }
                warn!(attempt, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolation_level_sql_strings() {
        assert_eq!(IsolationLevel::ReadCommitted.as_str(), "READ COMMITTED");
        assert_eq!(IsolationLevel::Serializable.as_str(), "SERIALIZABLE");
    }
}

//! Seam traits between the core and its external collaborators.
//!
//! The relational store and the remote cache are the only two dependencies
//! the core talks to over the network; both sit behind traits so tests and
//! alternative backends can be injected.

use async_trait::async_trait;
use std::time::Duration;

use crate::service::db::core::types::{QueryDescriptor, QueryResult};
use crate::tool::error::AppError;

/// Terminal executor over the relational store. Descriptors arriving here
/// have already been rewritten by the pipeline stages.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn execute(&self, query: &QueryDescriptor) -> Result<QueryResult, AppError>;
}

/// Remote key-value cache with TTL and pattern scanning.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;

    async fn delete(&self, keys: &[String]) -> Result<u64, AppError>;

    /// Keys matching a glob pattern, used by invalidation.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError>;
}

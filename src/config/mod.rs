//! Service configuration, loaded from the environment and validated before
//! any connection is opened.

pub mod cache;
pub mod db;
pub mod redis_config;

use std::time::Duration;

use crate::service::db::retry::RetryPolicy;
use crate::tool::error::AppError;

pub use cache::CacheConfig;

/// Middleware pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Queries slower than this emit a slow-query signal.
    pub slow_query_threshold: Duration,
    /// Whether the terminal SQL executor logs generated statements.
    pub log_queries: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: Duration::from_millis(1000),
            log_queries: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.slow_query_threshold.is_zero() {
            return Err(AppError::Configuration(
                "pipeline slow_query_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Aggregate configuration for the data-access core.
#[derive(Debug, Clone, Default)]
pub struct DataConfig {
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetryPolicy,
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.cache.validate()?;
        self.pipeline.validate()?;
        self.retry.validate()
    }
}

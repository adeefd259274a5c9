//! Logging stage: timing, slow-query and failure signals.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use super::{Next, QueryStage};
use crate::service::db::core::types::{QueryDescriptor, QueryResult};
use crate::tool::error::AppError;

pub struct LoggingStage {
    slow_query_threshold: Duration,
}

impl LoggingStage {
    pub fn new(slow_query_threshold: Duration) -> Self {
        Self {
            slow_query_threshold,
        }
    }
}

#[async_trait]
impl QueryStage for LoggingStage {
    async fn handle(&self, query: QueryDescriptor, next: Next<'_>) -> Result<QueryResult, AppError> {
        let model = query.model;
        let operation = query.operation;
        let start = Instant::now();

        let result = next.run(query).await;

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        match &result {
            Ok(_) if elapsed >= self.slow_query_threshold => {
                warn!(model = %model, operation = %operation, duration_ms, "slow query detected");
            }
            Ok(_) => {
                debug!(model = %model, operation = %operation, duration_ms, "query completed");
            }
            Err(err) => {
                error!(model = %model, operation = %operation, duration_ms, error = %err, "query failed");
            }
        }

        result
    }
}

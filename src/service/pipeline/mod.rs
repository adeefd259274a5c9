//! Query middleware pipeline.
//!
//! Every database call routed through the facade passes an explicit,
//! ordered stage chain: logging -> soft-delete rewriting -> caching. The
//! stage list is constructed once at service initialization and owned by
//! the facade; nothing registers itself on a global client. Stages may
//! rewrite the descriptor, short-circuit (cache hit), or delegate onward,
//! but they never swallow errors.

pub mod cache_stage;
pub mod logging;
pub mod soft_delete;

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::service::db::core::types::{QueryDescriptor, QueryResult};
use crate::tool::error::AppError;

pub use cache_stage::CacheStage;
pub use logging::LoggingStage;
pub use soft_delete::SoftDeleteStage;

pub type BoxQueryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<QueryResult, AppError>> + Send + 'a>>;

/// The actual store call at the end of the chain.
pub type TerminalExec<'a> = Box<dyn FnOnce(QueryDescriptor) -> BoxQueryFuture<'a> + Send + 'a>;

#[async_trait]
pub trait QueryStage: Send + Sync {
    async fn handle(&self, query: QueryDescriptor, next: Next<'_>) -> Result<QueryResult, AppError>;
}

/// Continuation over the remaining stages and the terminal executor.
pub struct Next<'a> {
    stages: &'a [Arc<dyn QueryStage>],
    terminal: Option<TerminalExec<'a>>,
}

impl<'a> Next<'a> {
    pub async fn run(mut self, query: QueryDescriptor) -> Result<QueryResult, AppError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    terminal: self.terminal.take(),
                };
                stage.handle(query, next).await
            }
            None => {
                let terminal = self.terminal.take().ok_or_else(|| {
                    AppError::InternalError("pipeline terminal executor already consumed".into())
                })?;
                terminal(query).await
            }
        }
    }
}

pub struct QueryPipeline {
    stages: Vec<Arc<dyn QueryStage>>,
}

impl QueryPipeline {
    pub fn new(stages: Vec<Arc<dyn QueryStage>>) -> Self {
        Self { stages }
    }

    /// Runs the descriptor through every stage down to the terminal
    /// executor. Failures propagate unmodified apart from being logged.
    pub async fn run<'a>(
        &'a self,
        query: QueryDescriptor,
        terminal: TerminalExec<'a>,
    ) -> Result<QueryResult, AppError> {
        Next {
            stages: &self.stages,
            terminal: Some(terminal),
        }
        .run(query)
        .await
    }
}

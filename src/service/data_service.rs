//! Database service facade.
//!
//! Composes the middleware pipeline, cache store, transaction executor, and
//! scoring engine behind the narrow operation set repositories consume.
//! Construction is an explicit `initialize` call made by the process entry
//! point; there is no singleton and no import-time side effect.

use sqlx::{MySql, Transaction};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::db::DbConfig;
use crate::config::redis_config::RedisConfig;
use crate::config::DataConfig;
use crate::service::cache::remote::RedisCache;
use crate::service::cache::store::CacheStore;
use crate::service::cache::sweep;
use crate::service::db::core::executor::SqlStore;
use crate::service::db::core::transaction::{TransactionExecutor, TxFuture};
use crate::service::db::core::types::{Model, QueryDescriptor, QueryResult};
use crate::service::db::retry::RetryPolicy;
use crate::service::matching::engine::MatchEngine;
use crate::service::matching::profile::{JobPosting, WorkerProfile};
use crate::service::matching::score::MatchScore;
use crate::service::pipeline::{
    CacheStage, LoggingStage, QueryPipeline, QueryStage, SoftDeleteStage, TerminalExec,
};
use crate::service::traits::{RelationalStore, RemoteCache};
use crate::tool::error::AppError;

pub struct DataService {
    pipeline: QueryPipeline,
    store: Arc<dyn RelationalStore>,
    cache: Arc<CacheStore>,
    transactions: Option<TransactionExecutor>,
    engine: MatchEngine,
    retry_policy: RetryPolicy,
    sweeper: Option<JoinHandle<()>>,
}

impl DataService {
    /// Explicit lifecycle entry point: validates configuration, connects
    /// MySQL and Redis, wires the stage chain, and starts the cache
    /// sweeper. An unreachable Redis downgrades the cache to the local
    /// tier; an unreachable database is fatal.
    pub async fn initialize(config: DataConfig) -> Result<Self, AppError> {
        config.validate()?;

        let db = DbConfig::new().await?;
        let store: Arc<dyn RelationalStore> =
            Arc::new(SqlStore::new(db.pool.clone(), config.pipeline.log_queries));
        let transactions = Some(TransactionExecutor::new(db.pool));

        let remote: Option<Arc<dyn RemoteCache>> = match RedisConfig::new().await {
            Ok(redis) => Some(Arc::new(RedisCache::new(redis))),
            Err(e) => {
                warn!(error = %e, "redis unavailable at startup, running on local cache tier only");
                None
            }
        };
        let cache = Arc::new(CacheStore::new(remote, config.cache.clone()));
        let sweeper = sweep::spawn_sweeper(Arc::clone(&cache), config.cache.sweep_interval);

        let service = Self::assemble(store, cache, transactions, config, Some(sweeper));
        info!("data service initialized");
        Ok(service)
    }

    /// Wires the facade from injected parts. Used by tests and callers that
    /// manage their own connections; no sweeper is spawned.
    pub fn with_parts(
        store: Arc<dyn RelationalStore>,
        cache: Arc<CacheStore>,
        transactions: Option<TransactionExecutor>,
        config: DataConfig,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self::assemble(store, cache, transactions, config, None))
    }

    fn assemble(
        store: Arc<dyn RelationalStore>,
        cache: Arc<CacheStore>,
        transactions: Option<TransactionExecutor>,
        config: DataConfig,
        sweeper: Option<JoinHandle<()>>,
    ) -> Self {
        let stages: Vec<Arc<dyn QueryStage>> = vec![
            Arc::new(LoggingStage::new(config.pipeline.slow_query_threshold)),
            Arc::new(SoftDeleteStage::new()),
            Arc::new(CacheStage::new(
                Arc::clone(&cache),
                config.cache.max_cacheable_page,
            )),
        ];
        let engine = MatchEngine::new(Arc::clone(&store), Arc::clone(&cache));

        Self {
            pipeline: QueryPipeline::new(stages),
            store,
            cache,
            transactions,
            engine,
            retry_policy: config.retry,
            sweeper,
        }
    }

    /// Routes a query through the middleware pipeline to the store.
    pub async fn run_query(&self, query: QueryDescriptor) -> Result<QueryResult, AppError> {
        let store = Arc::clone(&self.store);
        let terminal: TerminalExec<'_> =
            Box::new(move |q| Box::pin(async move { store.execute(&q).await }));
        self.pipeline.run(query, terminal).await
    }

    /// Caller-driven invalidation: every mutating repository operation on a
    /// cacheable model must call this after the write. The core never
    /// infers it from the mutation itself.
    pub async fn invalidate(&self, model: Model, id: Option<&str>) {
        self.cache.invalidate(model, id).await;
    }

    /// Retrying transactional execution of a multi-statement unit of work.
    pub async fn with_transaction<T, F>(
        &self,
        operation: F,
        policy: Option<RetryPolicy>,
    ) -> Result<T, AppError>
    where
        F: for<'c> Fn(&'c mut Transaction<'static, MySql>) -> TxFuture<'c, T> + Send + Sync,
        T: Send,
    {
        let executor = self.transactions.as_ref().ok_or_else(|| {
            AppError::Configuration("facade assembled without a transactional store".into())
        })?;
        let policy = policy.unwrap_or_else(|| self.retry_policy.clone());
        executor.execute(&policy, operation).await
    }

    /// Worker-to-job match score; cached per pair, persisted append-only.
    pub async fn score(
        &self,
        worker: &WorkerProfile,
        job: &JobPosting,
    ) -> Result<MatchScore, AppError> {
        self.engine.score(worker, job).await
    }

    /// Stops the background sweeper; dropping the service does the same.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

impl Drop for DataService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

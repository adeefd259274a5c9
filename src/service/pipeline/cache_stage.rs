//! Cache stage: read-through caching for simple reads on allow-listed
//! models.
//!
//! Queries with nested includes/selects/ordering, unlisted models, or
//! oversized pages pass straight through. Concurrent identical misses may
//! both recompute; there is no single-flight deduplication.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Next, QueryStage};
use crate::service::cache::key;
use crate::service::cache::store::CacheStore;
use crate::service::db::core::types::{Operation, QueryDescriptor, QueryResult};
use crate::tool::error::AppError;

pub struct CacheStage {
    store: Arc<CacheStore>,
    max_cacheable_page: u32,
}

impl CacheStage {
    pub fn new(store: Arc<CacheStore>, max_cacheable_page: u32) -> Self {
        Self {
            store,
            max_cacheable_page,
        }
    }

    fn is_cacheable(&self, query: &QueryDescriptor) -> bool {
        if !query.operation.is_read() {
            return false;
        }
        if query.has_relations || !query.model.cacheable() {
            return false;
        }
        if query.operation == Operation::FindMany {
            // unbounded pages are never cached
            return query
                .take
                .map_or(false, |take| take <= self.max_cacheable_page);
        }
        true
    }
}

#[async_trait]
impl QueryStage for CacheStage {
    async fn handle(&self, query: QueryDescriptor, next: Next<'_>) -> Result<QueryResult, AppError> {
        if !self.is_cacheable(&query) {
            return next.run(query).await;
        }

        let cache_key = key::cache_key(&query);
        if let Some(hit) = self.store.get(&cache_key).await {
            debug!(model = %query.model, operation = %query.operation, "cache hit");
            return Ok(hit);
        }

        let model = query.model;
        let ttl = self.store.ttl_for(model);
        let result = next.run(query).await?;
        self.store.set(&cache_key, &result, ttl).await;
        debug!(model = %model, key = %cache_key, ttl_secs = ttl.as_secs(), "cache filled");
        Ok(result)
    }
}

//! Dual-tier cache store.
//!
//! Remote Redis tier first, in-process `DashMap` tier as fallback. Remote
//! failures degrade the call, never fail it; the local tier enforces TTL on
//! read and is additionally swept by a background task. Concurrent writers
//! race with last-write-wins semantics and readers tolerate entries
//! disappearing between check and read.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::cache::CacheConfig;
use crate::service::cache::key;
use crate::service::db::core::types::Model;
use crate::service::traits::RemoteCache;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is never served once `now - stored_at >= ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

pub struct CacheStore {
    remote: Option<Arc<dyn RemoteCache>>,
    local: DashMap<String, CacheEntry>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(remote: Option<Arc<dyn RemoteCache>>, config: CacheConfig) -> Self {
        Self {
            remote,
            local: DashMap::new(),
            config,
        }
    }

    pub fn ttl_for(&self, model: Model) -> Duration {
        self.config.ttl_for(model)
    }

    /// Remote tier first; on remote error or miss, the local entry is
    /// served only while fresh. A stale local entry is removed and reported
    /// as a miss.
    pub async fn get(&self, cache_key: &str) -> Option<Value> {
        if let Some(remote) = &self.remote {
            match remote.get(cache_key).await {
                Ok(Some(raw)) => match serde_json::from_str(&raw) {
                    Ok(value) => return Some(value),
                    Err(e) => {
                        warn!(key = cache_key, error = %e, "discarding undecodable remote entry")
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(key = cache_key, error = %e, "remote cache unavailable, trying local tier")
                }
            }
        }

        let now = Instant::now();
        let (value, expired) = match self.local.get(cache_key) {
            Some(entry) if entry.is_fresh(now) => (Some(entry.value.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            self.local.remove(cache_key);
        }
        value
    }

    /// Local tier always; remote tier best-effort.
    pub async fn set(&self, cache_key: &str, value: &Value, ttl: Duration) {
        self.local
            .insert(cache_key.to_string(), CacheEntry::new(value.clone(), ttl));

        if let Some(remote) = &self.remote {
            match serde_json::to_string(value) {
                Ok(raw) => {
                    if let Err(e) = remote.set_ex(cache_key, &raw, ttl).await {
                        warn!(key = cache_key, error = %e, "best-effort remote cache write failed");
                    }
                }
                Err(e) => warn!(key = cache_key, error = %e, "cache value not serializable"),
            }
        }
    }

    /// Pattern invalidation over both tiers. Called by repositories after
    /// mutating a cacheable model; cache unavailability only narrows the
    /// purge to the local tier.
    pub async fn invalidate(&self, model: Model, id: Option<&str>) {
        if let Some(remote) = &self.remote {
            let pattern = key::model_pattern(model, id);
            match remote.keys(&pattern).await {
                Ok(keys) if !keys.is_empty() => match remote.delete(&keys).await {
                    Ok(deleted) => {
                        debug!(model = %model, deleted, "remote cache invalidated")
                    }
                    Err(e) => warn!(model = %model, error = %e, "remote cache delete failed"),
                },
                Ok(_) => {}
                Err(e) => {
                    warn!(model = %model, error = %e, "remote invalidation skipped, cache unavailable")
                }
            }
        }

        let prefix = key::model_prefix(model);
        match id {
            Some(id) => {
                let suffix = format!(":{id}");
                self.local
                    .retain(|k, _| !(k.starts_with(&prefix) && k.ends_with(&suffix)));
            }
            None => self.local.retain(|k, _| !k.starts_with(&prefix)),
        }
    }

    /// Evicts expired local entries; returns how many were removed. Driven
    /// by the periodic sweep to bound memory growth independent of reads.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.local.len();
        self.local.retain(|_, entry| entry.is_fresh(now));
        before.saturating_sub(self.local.len())
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_stored_secs_ago(secs: u64, ttl_secs: u64) -> CacheEntry {
        let stored_at = Instant::now()
            .checked_sub(Duration::from_secs(secs))
            .expect("instant arithmetic");
        CacheEntry {
            value: json!({"id": 1}),
            stored_at,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    #[test]
    fn entry_is_fresh_just_inside_its_ttl() {
        let entry = entry_stored_secs_ago(299, 300);
        assert!(entry.is_fresh(Instant::now()));
    }

    #[test]
    fn entry_expires_just_past_its_ttl() {
        let entry = entry_stored_secs_ago(301, 300);
        assert!(!entry.is_fresh(Instant::now()));
    }

    #[tokio::test]
    async fn stale_local_entries_read_as_misses_and_are_dropped() {
        let store = CacheStore::new(None, CacheConfig::default());
        store
            .local
            .insert("cache:user:find_one:abc".into(), entry_stored_secs_ago(400, 300));

        assert_eq!(store.get("cache:user:find_one:abc").await, None);
        assert_eq!(store.local_len(), 0);
    }

    #[tokio::test]
    async fn local_tier_round_trips_without_a_remote() {
        let store = CacheStore::new(None, CacheConfig::default());
        let value = json!({"id": 7, "name": "alice"});
        store
            .set("cache:user:find_one:k7:7", &value, Duration::from_secs(60))
            .await;
        assert_eq!(store.get("cache:user:find_one:k7:7").await, Some(value));
    }

    #[tokio::test]
    async fn invalidation_purges_by_model_prefix() {
        let store = CacheStore::new(None, CacheConfig::default());
        let ttl = Duration::from_secs(60);
        store.set("cache:user:find_one:aaaa:1", &json!(1), ttl).await;
        store.set("cache:user:find_many:bbbb", &json!([1]), ttl).await;
        store.set("cache:job:find_one:cccc:9", &json!(9), ttl).await;

        store.invalidate(Model::User, None).await;
        assert_eq!(store.get("cache:user:find_one:aaaa:1").await, None);
        assert_eq!(store.get("cache:user:find_many:bbbb").await, None);
        assert!(store.get("cache:job:find_one:cccc:9").await.is_some());
    }

    #[tokio::test]
    async fn id_scoped_invalidation_leaves_other_entities_alone() {
        let store = CacheStore::new(None, CacheConfig::default());
        let ttl = Duration::from_secs(60);
        store.set("cache:user:find_one:aaaa:1", &json!(1), ttl).await;
        store.set("cache:user:find_one:dddd:2", &json!(2), ttl).await;

        store.invalidate(Model::User, Some("1")).await;
        assert_eq!(store.get("cache:user:find_one:aaaa:1").await, None);
        assert!(store.get("cache:user:find_one:dddd:2").await.is_some());
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let store = CacheStore::new(None, CacheConfig::default());
        store
            .local
            .insert("cache:user:a".into(), entry_stored_secs_ago(400, 300));
        store
            .local
            .insert("cache:user:b".into(), entry_stored_secs_ago(10, 300));

        assert_eq!(store.evict_expired(), 1);
        assert_eq!(store.local_len(), 1);
    }
}

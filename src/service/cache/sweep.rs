//! Periodic eviction of expired in-process cache entries.
//!
//! Read-time TTL checks alone cannot bound memory: a key that stops being
//! read would pin its entry forever. The sweep runs as an independent
//! recurring task.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::service::cache::store::CacheStore;

pub fn spawn_sweeper(store: Arc<CacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired();
            if evicted > 0 {
                debug!(evicted, remaining = store.local_len(), "cache sweep evicted expired entries");
            }
        }
    })
}

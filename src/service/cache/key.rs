//! Deterministic cache-key generation.
//!
//! Keys hash the filter predicate, page size, aggregate spec, and the
//! current minute bucket under a `cache:{model}:{operation}:` prefix. The
//! minute bucket caps worst-case staleness for logically identical queries
//! at ~60s past the nominal TTL; two requests straddling a minute boundary
//! may compute different keys and forego a hit. That imprecision is
//! deliberate and load-bearing for hit-rate characteristics.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::service::db::core::types::{Model, QueryDescriptor};
use crate::tool::current_time;

pub const KEY_PREFIX: &str = "cache";

pub fn cache_key(query: &QueryDescriptor) -> String {
    cache_key_at(query, current_time::minute_bucket())
}

pub fn cache_key_at(query: &QueryDescriptor, minute_bucket: i64) -> String {
    // BTreeMap so filter insertion order never changes the digest
    let ordered: BTreeMap<&str, &Value> = query
        .filter
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    let filter_json = serde_json::to_string(&ordered).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(filter_json.as_bytes());
    if let Some(take) = query.take {
        hasher.update(take.to_be_bytes());
    }
    if let Some(agg) = &query.aggregate {
        hasher.update(agg.func.sql().as_bytes());
        hasher.update(agg.column.as_bytes());
    }
    hasher.update(minute_bucket.to_be_bytes());
    let digest = hex::encode(hasher.finalize());

    let base = format!(
        "{KEY_PREFIX}:{}:{}:{}",
        query.model,
        query.operation,
        &digest[..16]
    );
    match id_segment(query) {
        Some(id) => format!("{base}:{id}"),
        None => base,
    }
}

/// Entity-scoped queries carry their id as a trailing key segment so
/// id-level invalidation globs can reach them.
fn id_segment(query: &QueryDescriptor) -> Option<String> {
    match query.filter.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Glob pattern for remote invalidation, derived from model and optional id.
pub fn model_pattern(model: Model, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{KEY_PREFIX}:{model}:*:{id}"),
        None => format!("{KEY_PREFIX}:{model}:*"),
    }
}

/// Local-tier prefix for the same invalidation scope.
pub fn model_prefix(model: Model) -> String {
    format!("{KEY_PREFIX}:{model}:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::db::core::types::{Model, Operation};
    use serde_json::json;

    fn descriptor() -> QueryDescriptor {
        QueryDescriptor::new(Model::User, Operation::FindOne)
            .filter("email", json!("a@example.com"))
            .filter("status", json!("active"))
    }

    #[test]
    fn identical_queries_hash_identically() {
        assert_eq!(cache_key_at(&descriptor(), 100), cache_key_at(&descriptor(), 100));
    }

    #[test]
    fn filter_insertion_order_does_not_matter() {
        let reversed = QueryDescriptor::new(Model::User, Operation::FindOne)
            .filter("status", json!("active"))
            .filter("email", json!("a@example.com"));
        assert_eq!(cache_key_at(&descriptor(), 100), cache_key_at(&reversed, 100));
    }

    #[test]
    fn minute_bucket_changes_the_key() {
        assert_ne!(cache_key_at(&descriptor(), 100), cache_key_at(&descriptor(), 101));
    }

    #[test]
    fn page_size_changes_the_key() {
        let q = QueryDescriptor::new(Model::Job, Operation::FindMany);
        assert_ne!(
            cache_key_at(&q.clone().take(10), 100),
            cache_key_at(&q.take(20), 100)
        );
    }

    #[test]
    fn id_filters_surface_in_the_key() {
        let q = QueryDescriptor::new(Model::User, Operation::FindOne).filter("id", json!(42));
        let key = cache_key_at(&q, 100);
        assert!(key.starts_with("cache:user:find_one:"));
        assert!(key.ends_with(":42"));
    }

    #[test]
    fn patterns_scope_to_model_and_id() {
        assert_eq!(model_pattern(Model::User, None), "cache:user:*");
        assert_eq!(model_pattern(Model::User, Some("42")), "cache:user:*:42");
    }
}

//! Cache tier configuration: TTL policy, sweep interval, page-size cap.

use std::collections::HashMap;
use std::time::Duration;

use crate::service::db::core::types::{Model, Volatility};
use crate::tool::error::AppError;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for models with no volatility classification.
    pub default_ttl: Duration,
    /// TTL for volatile models (users, applications, payment-like data).
    pub volatile_ttl: Duration,
    /// TTL for stable lookup/reference data.
    pub stable_ttl: Duration,
    /// Per-model TTL overrides, taking precedence over the classification.
    pub overrides: HashMap<Model, Duration>,
    /// Interval of the background eviction sweep over the local tier.
    pub sweep_interval: Duration,
    /// Largest find-many page size the cache stage will serve.
    pub max_cacheable_page: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            volatile_ttl: Duration::from_secs(300),
            stable_ttl: Duration::from_secs(86_400),
            overrides: HashMap::new(),
            sweep_interval: Duration::from_secs(60),
            max_cacheable_page: 100,
        }
    }
}

impl CacheConfig {
    /// Fails fast on values that would silently disable or wedge the cache.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, ttl) in [
            ("default_ttl", self.default_ttl),
            ("volatile_ttl", self.volatile_ttl),
            ("stable_ttl", self.stable_ttl),
        ] {
            if ttl.is_zero() {
                return Err(AppError::Configuration(format!("cache {name} must be positive")));
            }
        }
        if let Some((model, _)) = self.overrides.iter().find(|(_, ttl)| ttl.is_zero()) {
            return Err(AppError::Configuration(format!(
                "cache ttl override for {model} must be positive"
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(AppError::Configuration("cache sweep_interval must be positive".into()));
        }
        if self.max_cacheable_page == 0 {
            return Err(AppError::Configuration(
                "cache max_cacheable_page must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn ttl_for(&self, model: Model) -> Duration {
        if let Some(ttl) = self.overrides.get(&model) {
            return *ttl;
        }
        match model.volatility() {
            Volatility::Volatile => self.volatile_ttl,
            Volatility::Stable => self.stable_ttl,
            Volatility::Standard => self.default_ttl,
        }
    }
}

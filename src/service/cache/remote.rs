//! Redis-backed remote cache tier.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

use crate::config::redis_config::RedisConfig;
use crate::service::traits::RemoteCache;
use crate::tool::error::AppError;

pub struct RedisCache {
    conn: RedisConfig,
}

impl RedisCache {
    pub fn new(conn: RedisConfig) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RemoteCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.get_connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.conn.get_connection();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, AppError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.get_connection();
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.get_connection();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}

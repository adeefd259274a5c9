//! Redis connection configuration for the remote cache tier.

use dotenv::dotenv;
use redis::{aio::ConnectionManager, Client};
use std::env;
use tracing::{info, warn};

use crate::tool::error::AppError;

pub type RedisConnection = ConnectionManager;

#[derive(Clone)]
pub struct RedisConfig {
    pub conn: RedisConnection,
    pub host: String,
    pub port: u16,
}

impl RedisConfig {
    pub async fn new() -> Result<Self, AppError> {
        dotenv().ok();

        let host = env::var("redis_host").unwrap_or_else(|_| {
            warn!("redis_host not set, using localhost");
            "localhost".to_string()
        });
        let port = env::var("redis_port")
            .ok()
            .map(|p| {
                p.parse::<u16>().map_err(|_| {
                    AppError::Configuration(format!("redis_port is not a number: {p}"))
                })
            })
            .transpose()?
            .unwrap_or(6379);

        let client = Client::open(format!("redis://{host}:{port}"))?;
        let conn = ConnectionManager::new(client).await?;

        info!(host = %host, port, "redis connection manager initialized");

        Ok(Self { conn, host, port })
    }

    /// Connection manager clones are cheap handles over one multiplexed
    /// connection.
    pub fn get_connection(&self) -> RedisConnection {
        self.conn.clone()
    }
}

//! MySQL database configuration.
//!
//! Reads connection settings from `.env`/environment variables and builds
//! the shared connection pool. Missing variables fall back to local-dev
//! defaults.

use dotenv::dotenv;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::tool::error::AppError;

/// MySQL connection pool type alias.
pub type DbConnection = Pool<MySql>;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub pool: DbConnection,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConfig {
    pub async fn new() -> Result<Self, AppError> {
        dotenv().ok();

        let host = env::var("db_host").unwrap_or_else(|_| {
            warn!("db_host not set, using localhost");
            "localhost".to_string()
        });
        let port = env::var("db_port")
            .ok()
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|_| AppError::Configuration(format!("db_port is not a number: {p}")))
            })
            .transpose()?
            .unwrap_or(3306);
        let user = env::var("db_user").unwrap_or_else(|_| "root".to_string());
        let password = env::var("db_password").unwrap_or_default();
        let database = env::var("db_name").unwrap_or_else(|_| "jobmarket".to_string());

        let url = format!("mysql://{user}:{password}@{host}:{port}/{database}");

        let pool = MySqlPoolOptions::new()
            .min_connections(2)
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(&url)
            .await
            .map_err(|e| {
                AppError::DatabaseConnection(format!("failed to connect to {host}:{port}: {e}"))
            })?;

        info!(host = %host, port, database = %database, "database pool initialized");

        Ok(Self {
            pool,
            host,
            port,
            database,
        })
    }
}

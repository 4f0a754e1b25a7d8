// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Default number of items per page for paginated listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `page_size` on every paginated endpoint.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Display name used in reports when an attempt's user cannot be resolved.
pub const UNKNOWN_USER_NAME: &str = "Unknown";

/// How many times attempt creation is retried after losing an
/// attempt-number race against a concurrent start.
pub const ATTEMPT_NUMBER_RETRIES: usize = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            db_max_connections,
        }
    }
}

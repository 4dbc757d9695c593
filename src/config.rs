use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Absent means the process keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub seed_demo_users: bool,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed("LOG_LEVEL", tracing::Level::DEBUG)?,

            seed_demo_users: parsed("SEED_DEMO_USERS", true)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: "test-secret".into(),
        access_token_ttl: 900,
        rate_login_per_min: 60,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
        seed_demo_users: false,
    }
}

//! Runtime configuration, read from the process environment (and `.env` via dotenvy).

use std::env;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

const DEV_SECRET_KEY: &str = "dev-key-change-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct ForumConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub secret_key: String,
    /// Directory avatar thumbnails are written to. Users store only the file name.
    pub avatar_dir: PathBuf,
    pub session_ttl: Duration,
    /// Session lifetime when the user asked to be remembered at login.
    pub remember_ttl: Duration,
    pub page_size: u64,
    pub max_upload_bytes: usize,
}

impl ForumConfig {
    /// Defaults for everything except the database location.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: "0.0.0.0:3000".to_owned(),
            secret_key: DEV_SECRET_KEY.to_owned(),
            avatar_dir: PathBuf::from("static/avatars"),
            session_ttl: Duration::hours(24),
            remember_ttl: Duration::days(30),
            page_size: 10,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::for_database(database_url);

        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => config.secret_key = key,
            _ => warn!("SECRET_KEY is not set, falling back to the development key"),
        }
        if let Ok(dir) = env::var("AVATAR_DIR") {
            config.avatar_dir = PathBuf::from(dir);
        }
        if let Some(hours) = parse_var::<i64>("SESSION_TTL_HOURS")? {
            config.session_ttl = Duration::hours(hours);
        }
        if let Some(days) = parse_var::<i64>("REMEMBER_TTL_DAYS")? {
            config.remember_ttl = Duration::days(days);
        }
        if let Some(size) = parse_var::<u64>("PAGE_SIZE")? {
            config.page_size = size.max(1);
        }
        if let Some(bytes) = parse_var::<usize>("MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = bytes;
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_forum_limits() {
        let config = ForumConfig::for_database("sqlite::memory:");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::hours(24));
        assert!(config.remember_ttl > config.session_ttl);
    }
}

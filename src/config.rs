//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use chrono::{FixedOffset, Local, Offset, Utc};
use std::env;

/// Minimum accepted length of the JWT signing key in bytes.
pub const MIN_JWT_KEY_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx connection string (e.g. `sqlite://vita.db?mode=rwc`)
    pub database_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Additional CORS origins, e.g. a local dev server. Empty in production.
    pub extra_origins: Vec<String>,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Offset used to decide where a calendar day starts and ends
    pub day_offset: FixedOffset,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            extra_origins: Vec::new(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            day_offset: Utc.fix(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .trim()
            .as_bytes()
            .to_vec();
        if jwt_signing_key.len() < MIN_JWT_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SIGNING_KEY",
                reason: format!("must be at least {} bytes", MIN_JWT_KEY_LEN),
            });
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://vita.db?mode=rwc".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            extra_origins: parse_origin_list(env::var("CORS_EXTRA_ORIGINS").ok().as_deref()),
            port: parse_port(env::var("PORT").ok().as_deref())?,
            jwt_signing_key,
            day_offset: parse_day_offset(env::var("DAY_UTC_OFFSET_MINUTES").ok().as_deref())?,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Comma-separated origins; blank entries are dropped.
fn parse_origin_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the listen port, defaulting to 8080 when unset.
fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    let Some(raw) = raw else {
        return Ok(8080);
    };
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name: "PORT",
        reason: format!("{:?} is not a port number", raw),
    })
}

/// Parse the day-boundary offset, falling back to the host's local offset.
fn parse_day_offset(raw: Option<&str>) -> Result<FixedOffset, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Local::now().offset().fix());
    };

    let invalid = |reason: &str| ConfigError::Invalid {
        name: "DAY_UTC_OFFSET_MINUTES",
        reason: reason.to_string(),
    };

    let minutes: i32 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("must be an integer number of minutes"))?;

    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| invalid("must be within +/- 24 hours"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

//! Configuration management for Auth Service
//!
//! Loads settings from environment variables, with a `.env` file honoured in
//! debug builds.

use anyhow::{bail, Context, Result};
use session_auth::SessionConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub session: SessionSettings,
    pub redis: RedisSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            session: SessionSettings::from_env()?,
            redis: RedisSettings::from_env()?,
        })
    }
}

fn parse_env<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {}", name))
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .to_string();

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("SERVER_PORT", "8080")?,
            workers: parse_env("SERVER_WORKERS", &default_workers)?,
        })
    }
}

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Per-request deadline for ledger and directory calls
    pub request_timeout: Duration,
    pub cleanup_grace: Duration,
}

impl SessionSettings {
    fn from_env() -> Result<Self> {
        let settings = Self {
            access_token_ttl: Duration::from_secs(parse_env("ACCESS_TOKEN_TTL_SECS", "3600")?),
            refresh_token_ttl: Duration::from_secs(parse_env(
                "REFRESH_TOKEN_TTL_SECS",
                "604800",
            )?),
            request_timeout: Duration::from_millis(parse_env("REQUEST_TIMEOUT_MS", "5000")?),
            cleanup_grace: Duration::from_millis(parse_env("CLEANUP_GRACE_MS", "2000")?),
        };

        if settings.access_token_ttl >= settings.refresh_token_ttl {
            bail!("ACCESS_TOKEN_TTL_SECS must be shorter than REFRESH_TOKEN_TTL_SECS");
        }

        Ok(settings)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
            cleanup_grace: self.cleanup_grace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Redis,
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(LedgerBackend::Redis),
            "memory" => Ok(LedgerBackend::Memory),
            other => bail!("unknown SESSION_LEDGER backend: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub ledger: LedgerBackend,
    pub url: String,
    pub response_timeout: Duration,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        let ledger: LedgerBackend = env::var("SESSION_LEDGER")
            .unwrap_or_else(|_| "redis".to_string())
            .parse()?;

        let url = match ledger {
            LedgerBackend::Redis => env::var("REDIS_URL").context("REDIS_URL must be set")?,
            LedgerBackend::Memory => env::var("REDIS_URL").unwrap_or_default(),
        };

        Ok(Self {
            ledger,
            url,
            response_timeout: Duration::from_millis(parse_env("REDIS_RESPONSE_TIMEOUT_MS", "3000")?),
        })
    }
}

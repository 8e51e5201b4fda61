//! Service configuration.
//!
//! Loaded once at startup from environment variables. Every setting has a
//! default, so the service runs unconfigured against a local Redis. The
//! signing secret and the Redis URL are redacted in Debug output.

use std::{
    collections::HashMap,
    env, fmt,
    net::{SocketAddr, ToSocketAddrs},
    time::Duration,
};

use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Default signing secret. Anyone who knows it can mint valid tokens.
pub const DEFAULT_TOKEN_SECRET: &str = "AllYourBase";

pub const DEFAULT_TOKEN_ISSUER: &str = "authentication-api";

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 24 * 60 * 60;

/// Upper bound on the token lifetime: ten years.
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    /// Socket address the HTTP server listens on. Host names are resolved
    /// once at load time and the first address is used.
    pub bind_address: SocketAddr,
    /// Credential store URL; may embed a password.
    pub redis_url: String,
    pub token_secret: String,
    pub token_issuer: String,
    pub token_lifetime: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("redis_url", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("token_issuer", &self.token_issuer)
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = resolve_bind_address(
            vars.get("AUTH_API_BIND_ADDRESS")
                .map(String::as_str)
                .unwrap_or(DEFAULT_BIND_ADDRESS),
        )?;

        let redis_url = vars
            .get("REDIS_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let token_secret = vars
            .get("AUTH_API_TOKEN_SECRET")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOKEN_SECRET.to_string());
        if token_secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "AUTH_API_TOKEN_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let token_issuer = vars
            .get("AUTH_API_TOKEN_ISSUER")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOKEN_ISSUER.to_string());

        let token_lifetime_seconds: u64 = match vars.get("AUTH_API_TOKEN_LIFETIME_SECONDS") {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: "AUTH_API_TOKEN_LIFETIME_SECONDS",
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_TOKEN_LIFETIME_SECONDS,
        };
        if token_lifetime_seconds > MAX_TOKEN_LIFETIME_SECONDS {
            return Err(ConfigError::InvalidValue {
                name: "AUTH_API_TOKEN_LIFETIME_SECONDS",
                reason: format!("must be at most {MAX_TOKEN_LIFETIME_SECONDS}"),
            });
        }

        Ok(Config {
            bind_address,
            redis_url,
            token_secret,
            token_issuer,
            token_lifetime: Duration::from_secs(token_lifetime_seconds),
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.token_secret == DEFAULT_TOKEN_SECRET
    }
}

fn resolve_bind_address(value: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: "AUTH_API_BIND_ADDRESS",
        reason,
    };

    value
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid(format!("{value} did not resolve to any address")))
}

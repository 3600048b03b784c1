//! Server configuration from the environment.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use congregate_auth::{FallbackTable, Role};
use congregate_core::CacheLimits;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Tenants are addressed as `<slug>.<base_domain>` when set.
    pub base_domain: Option<String>,
    /// How long middleware waits for a pending session/tenant lookup.
    pub resolve_wait: Duration,
    /// Deny roles the fallback table does not list instead of sending them to the dashboard.
    pub strict_fallbacks: bool,
    /// Bounds of the per-user profile and per-tenant organization caches.
    pub cache: CacheLimits,
    pub seed_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: "dev-secret".to_string(),
            base_domain: None,
            resolve_wait: Duration::from_millis(250),
            strict_fallbacks: false,
            cache: CacheLimits::default(),
            seed_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("CONGREGATE_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| ConfigError::invalid("CONGREGATE_BIND_ADDR", format!("{e}")))?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        config.base_domain = lookup("CONGREGATE_BASE_DOMAIN").filter(|d| !d.is_empty());

        if let Some(ms) = lookup("CONGREGATE_RESOLVE_WAIT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|e| ConfigError::invalid("CONGREGATE_RESOLVE_WAIT_MS", format!("{e}")))?;
            config.resolve_wait = Duration::from_millis(ms);
        }

        if let Some(flag) = lookup("CONGREGATE_STRICT_FALLBACKS") {
            config.strict_fallbacks = parse_bool(&flag)
                .ok_or_else(|| ConfigError::invalid("CONGREGATE_STRICT_FALLBACKS", "expected true/false"))?;
        }

        if let Some(raw) = lookup("CONGREGATE_CACHE_CAPACITY") {
            config.cache.capacity = raw
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::invalid("CONGREGATE_CACHE_CAPACITY", format!("{e}")))?;
        }

        if let Some(raw) = lookup("CONGREGATE_CACHE_TTL_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| ConfigError::invalid("CONGREGATE_CACHE_TTL_SECS", format!("{e}")))?;
            config.cache.ttl = Duration::from_secs(secs);
        }

        config.seed_file = lookup("CONGREGATE_SEED_FILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Fallback table used by every guarded route.
    pub fn fallback_table(&self) -> FallbackTable {
        if self.strict_fallbacks {
            FallbackTable::strict([
                (Role::PARTICIPANT, FallbackTable::ROOT_PATH),
                (Role::ADMIN, FallbackTable::DASHBOARD_PATH),
                (Role::OWNER, FallbackTable::DASHBOARD_PATH),
            ])
        } else {
            FallbackTable::default()
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

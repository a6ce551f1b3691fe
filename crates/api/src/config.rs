//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::SagaOptions;
use search::SearchOptions;
use store::LockOptions;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info,tower_http=debug"`)
/// - `SUPPLIER_TIMEOUT_MS`: budget for one supplier call (default: `5000`)
/// - `EVALUATION_TTL_SECS`: how long priced offers stay bookable (default: `900`)
/// - `SETTINGS_CACHE_TTL_SECS`: merged booking settings cache (default: `300`)
/// - `ENTITY_LOCK_TTL_SECS`: booking and payment lock token lifetime (default: `30`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub supplier_timeout: Duration,
    pub evaluation_ttl: Duration,
    pub settings_cache_ttl: Duration,
    pub entity_lock_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from any variable source. Unparseable values fall
    /// back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |name: &str| lookup(name).and_then(|value| value.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            supplier_timeout: number("SUPPLIER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.supplier_timeout),
            evaluation_ttl: number("EVALUATION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.evaluation_ttl),
            settings_cache_ttl: number("SETTINGS_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.settings_cache_ttl),
            entity_lock_ttl: number("ENTITY_LOCK_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.entity_lock_ttl),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            supplier_timeout: self.supplier_timeout,
            evaluation_ttl: self.evaluation_ttl,
        }
    }

    pub fn saga_options(&self) -> SagaOptions {
        SagaOptions {
            supplier_timeout: self.supplier_timeout,
            lock: LockOptions {
                token_ttl: self.entity_lock_ttl,
                ..LockOptions::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info,tower_http=debug".to_string(),
            supplier_timeout: Duration::from_millis(5000),
            evaluation_ttl: Duration::from_secs(900),
            settings_cache_ttl: Duration::from_secs(300),
            entity_lock_ttl: Duration::from_secs(30),
        }
    }
}

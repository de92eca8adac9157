//! API Configuration Module
//!
//! This module provides configuration for the listener, CORS, storage
//! backend selection and startup behavior. Configuration is loaded from
//! environment variables with sensible defaults for development.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use worktrail_core::{ConfigError, WorktrailResult};

// ============================================================================
// STORAGE BACKEND
// ============================================================================

/// Which `ExperienceStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "WORKTRAIL_STORAGE".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => write!(f, "postgres"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for the listener, CORS and storage.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host
    pub bind_host: String,

    /// Listen port
    pub port: u16,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Storage and startup
    // ========================================================================
    /// Storage backend
    pub storage: StorageBackend,

    /// Raw `WORKTRAIL_STORAGE` value, kept for validation
    storage_raw: Option<String>,

    /// Seed the starter columns at startup
    pub seed_defaults: bool,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
            storage: StorageBackend::Postgres,
            storage_raw: None,
            seed_defaults: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `WORKTRAIL_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` / `WORKTRAIL_API_PORT`: Listen port (default: 3000)
    /// - `WORKTRAIL_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `WORKTRAIL_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `WORKTRAIL_STORAGE`: "postgres" or "memory" (default: postgres)
    /// - `WORKTRAIL_SEED_DEFAULTS`: "true" or "false" (default: true)
    /// - `WORKTRAIL_REQUEST_TIMEOUT_SECS`: Request timeout (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_host = lookup("WORKTRAIL_API_BIND").unwrap_or(defaults.bind_host);

        // Unparsable ports map to 0 so validate() reports them.
        let port = lookup("PORT")
            .or_else(|| lookup("WORKTRAIL_API_PORT"))
            .map(|s| s.trim().parse().unwrap_or(0))
            .unwrap_or(defaults.port);

        let cors_origins = lookup("WORKTRAIL_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = lookup("WORKTRAIL_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let storage_raw = lookup("WORKTRAIL_STORAGE");
        let storage = storage_raw
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.storage);

        let seed_defaults = lookup("WORKTRAIL_SEED_DEFAULTS")
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.seed_defaults);

        let request_timeout = lookup("WORKTRAIL_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            bind_host,
            port,
            cors_origins,
            cors_max_age_secs,
            storage,
            storage_raw,
            seed_defaults,
            request_timeout,
        }
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> WorktrailResult<()> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: "0".to_string(),
                reason: "port must be a non-zero integer".to_string(),
            }
            .into());
        }
        if let Some(raw) = &self.storage_raw {
            raw.parse::<StorageBackend>()?;
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "WORKTRAIL_REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> WorktrailResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue {
                field: "WORKTRAIL_API_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ApiConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_host, "0.0.0.0");
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert!(config.seed_defaults);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() -> WorktrailResult<()> {
        let config = config_from(&[
            ("WORKTRAIL_API_BIND", "127.0.0.1"),
            ("WORKTRAIL_API_PORT", "8080"),
            ("WORKTRAIL_STORAGE", "memory"),
            ("WORKTRAIL_SEED_DEFAULTS", "false"),
            ("WORKTRAIL_CORS_ORIGINS", "https://a.example, https://b.example"),
        ]);
        assert_eq!(config.bind_addr()?.to_string(), "127.0.0.1:8080");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(!config.seed_defaults);
        assert_eq!(config.cors_origins.len(), 2);
        Ok(())
    }

    #[test]
    fn test_port_env_takes_precedence() {
        let config = config_from(&[("PORT", "9000"), ("WORKTRAIL_API_PORT", "8080")]);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_validate_rejects_zero_and_garbage_port() {
        assert!(config_from(&[("PORT", "0")]).validate().is_err());
        assert!(config_from(&[("PORT", "http")]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let config = config_from(&[("WORKTRAIL_STORAGE", "sqlite")]);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_origin_allowed() {
        let mut config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(!config.is_production());

        config.cors_origins = vec!["https://worktrail.dev".to_string(), "*.worktrail.dev".to_string()];
        assert!(config.is_production());
        assert!(config.is_origin_allowed("https://worktrail.dev"));
        assert!(config.is_origin_allowed("https://app.worktrail.dev"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://notworktrail.dev"));
    }
}

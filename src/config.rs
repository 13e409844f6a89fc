// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub webauthn: webauthn::WebAuthnConfig,
    pub cache: cache::CacheConfig,
    pub store: store::StoreConfig,
    pub metrics: MetricsBackend,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            webauthn: webauthn::WebAuthnConfig::from_env()?,
            cache: cache::CacheConfig::from_env()?,
            store: store::StoreConfig::from_env()?,
            metrics: MetricsBackend::from_env(),
        })
    }
}

/// Which metrics implementation backs `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsBackend {
    Noop,
    Prometheus,
}

impl MetricsBackend {
    /// Reads `PASSKEY_METRICS_TYPE`; anything but `prom` selects no-op metrics.
    pub fn from_env() -> Self {
        // ---
        match std::env::var("PASSKEY_METRICS_TYPE").as_deref() {
            Ok("prom") => MetricsBackend::Prometheus,
            _ => MetricsBackend::Noop,
        }
    }
}

// ============================================================
// Challenge and session cache configuration
// ============================================================

mod cache {
    // ---
    use super::*;

    /// Retention bounds for pending ceremonies and session tokens.
    ///
    /// Both caches evict least-recently-accessed entries beyond their
    /// capacity and drop entries not accessed within their TTL.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CacheConfig {
        /// Maximum pending requests per ceremony kind. Defaults to 100.
        pub challenge_capacity: usize,

        /// Idle time after which a pending request expires. Defaults to 10 minutes.
        pub challenge_ttl: Duration,

        /// Maximum live session tokens. Defaults to 100.
        pub session_capacity: usize,

        /// Idle time after which a session token expires. Defaults to 10 minutes.
        pub session_ttl: Duration,
    }

    impl Default for CacheConfig {
        fn default() -> Self {
            // ---
            Self {
                challenge_capacity: 100,
                challenge_ttl: Duration::from_secs(600),
                session_capacity: 100,
                session_ttl: Duration::from_secs(600),
            }
        }
    }

    impl CacheConfig {
        /// Builds a [`CacheConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if any bound is zero; a zero-sized or zero-lived
        /// cache would make every ceremony fail.
        pub fn from_env() -> Result<Self> {
            // ---
            let challenge_capacity = optional_env_parse!("PASSKEY_CHALLENGE_CAPACITY", usize, 100);
            let challenge_ttl_secs = optional_env_parse!("PASSKEY_CHALLENGE_TTL_SEC", u64, 600);
            let session_capacity = optional_env_parse!("PASSKEY_SESSION_CAPACITY", usize, 100);
            let session_ttl_secs = optional_env_parse!("PASSKEY_SESSION_TTL_SEC", u64, 600);

            let config = Self {
                challenge_capacity,
                challenge_ttl: Duration::from_secs(challenge_ttl_secs),
                session_capacity,
                session_ttl: Duration::from_secs(session_ttl_secs),
            };
            config.validate()?;
            Ok(config)
        }

        pub fn validate(&self) -> Result<()> {
            // ---
            if self.challenge_capacity == 0 || self.session_capacity == 0 {
                anyhow::bail!("Invalid configuration: cache capacity must be positive");
            }
            if self.challenge_ttl.is_zero() || self.session_ttl.is_zero() {
                anyhow::bail!("Invalid configuration: cache TTL must be positive");
            }
            Ok(())
        }
    }
}
pub use cache::CacheConfig;

// ============================================================
// Store backend configuration
// ============================================================

mod store {
    // ---
    use super::*;

    /// Where challenges and sessions are kept.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StoreConfig {
        /// Process-local stores; state is lost on restart.
        Memory,

        /// Challenges and sessions in Redis, shared between instances.
        Redis { url: String },
    }

    impl StoreConfig {
        /// Builds a [`StoreConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error for an unknown backend name, or if the Redis
        /// backend is selected without `PASSKEY_REDIS_URL`.
        pub fn from_env() -> Result<Self> {
            // ---
            let backend =
                std::env::var("PASSKEY_STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());

            match backend.as_str() {
                "memory" => Ok(StoreConfig::Memory),
                "redis" => {
                    let url = required_env!("PASSKEY_REDIS_URL");
                    Ok(StoreConfig::Redis { url })
                }
                other => Err(anyhow::anyhow!(
                    "Invalid configuration: unknown store backend \"{other}\""
                )),
            }
        }
    }
}
pub use store::StoreConfig;

// ============================================================
// WebAuthn configuration
// ============================================================

mod webauthn {
    // ---
    use super::*;

    /// WebAuthn / Passkeys configuration.
    ///
    /// These values define the relying party identity and security
    /// origin used during WebAuthn registration and authentication.
    #[derive(Debug, Clone)]
    pub struct WebAuthnConfig {
        /// Relying Party ID (typically a domain name).
        pub rp_id: String,

        /// Human-readable Relying Party name.
        pub rp_name: String,

        /// Fully-qualified origin (e.g. https://example.com).
        pub origin: String,
    }

    impl WebAuthnConfig {
        /// Builds a [`WebAuthnConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        /// WebAuthn configuration is considered security-critical
        /// and must be explicitly provided.
        pub fn from_env() -> Result<Self> {
            // ---
            let rp_id = required_env!("PASSKEY_WEBAUTHN_RP_ID");
            let origin = required_env!("PASSKEY_WEBAUTHN_ORIGIN");

            let rp_name = std::env::var("PASSKEY_WEBAUTHN_RP_NAME")
                .unwrap_or_else(|_| "Passkey Server".to_string());

            Ok(Self {
                rp_id,
                rp_name,
                origin,
            })
        }
    }
}
pub use webauthn::WebAuthnConfig;

// ============================================================
// Tests
// ============================================================

//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the calculator service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Listener configuration (bind address, request limits).
    pub listener: ListenerConfig,

    /// Global admission bucket.
    pub rate_limit: RateLimitConfig,

    /// Credential signing and validation.
    pub auth: AuthConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Operation history persistence.
    pub storage: StorageConfig,

    /// Users known to the directory at startup.
    pub users: Vec<UserConfig>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            storage: StorageConfig::default(),
            users: default_users(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Token bucket configuration. Not hot-reloadable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Burst size: tokens held when full.
    pub capacity: usize,

    /// Tokens added per second (1..=1000).
    pub refill_rate: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            refill_rate: 2,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens. Overridden by `JWT_SECRET`.
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,

    /// Clock skew tolerated when checking expiry.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Set JWT_SECRET in production.
            jwt_secret: "my-jwt-secret".to_string(),
            token_ttl_secs: 3600,
            leeway_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file the operation history is loaded from and saved to.
    /// Overridden by `HISTORY_PATH`. History is memory-only when unset.
    pub history_path: Option<String>,
}

/// A user seeded into the directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserConfig {
    pub id: i64,
    pub pseudo: String,
}

fn default_users() -> Vec<UserConfig> {
    vec![UserConfig {
        id: 1,
        pseudo: "p4p1".to_string(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: CalculatorConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.capacity, 5);
        assert_eq!(config.rate_limit.refill_rate, 2);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.users, default_users());
    }

    #[test]
    fn test_partial_sections() {
        let config: CalculatorConfig = toml::from_str(
            r#"
            [rate_limit]
            capacity = 20

            [[users]]
            id = 7
            pseudo = "ada"
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.capacity, 20);
        assert_eq!(config.rate_limit.refill_rate, 2);
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].pseudo, "ada");
    }
}

//! Configuration validation.
//!
//! Pure function over a parsed config that reports every problem at once.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CalculatorConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("rate_limit.capacity must be at least 1")]
    ZeroCapacity,

    #[error("rate_limit.refill_rate must be between 1 and 1000, got {0}")]
    RefillRateOutOfRange(u64),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("auth.jwt_secret must not be empty")]
    EmptySecret,

    #[error("duplicate user id {0}")]
    DuplicateUserId(i64),

    #[error("duplicate user pseudo {0:?}")]
    DuplicatePseudo(String),

    #[error("user {0} has an empty pseudo")]
    EmptyPseudo(i64),
}

/// Validate a parsed configuration, returning all errors found.
pub fn validate_config(config: &CalculatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }

    if config.rate_limit.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }
    if !(1..=1000).contains(&config.rate_limit.refill_rate) {
        errors.push(ValidationError::RefillRateOutOfRange(
            config.rate_limit.refill_rate,
        ));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::Zero("auth.token_ttl_secs"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut ids = HashSet::new();
    let mut pseudos = HashSet::new();
    for user in &config.users {
        if !ids.insert(user.id) {
            errors.push(ValidationError::DuplicateUserId(user.id));
        }
        if user.pseudo.is_empty() {
            errors.push(ValidationError::EmptyPseudo(user.id));
        } else if !pseudos.insert(user.pseudo.as_str()) {
            errors.push(ValidationError::DuplicatePseudo(user.pseudo.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

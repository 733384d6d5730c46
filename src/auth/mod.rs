//! Bearer credential issuance and verification.
//!
//! # Data Flow
//! ```text
//! POST /login
//!     → store::users (resolve pseudo)
//!     → TokenIssuer::issue (signed JWT)
//!
//! Protected request
//!     → security::auth (Authorization header)
//!     → TokenVerifier::validate (signature, expiry, subject)
//!     → store::users (resolve subject)
//! ```
//!
//! The gate only sees the two traits below, so the signing scheme is swappable
//! and tests can substitute doubles.

pub mod claims;
pub mod jwt;

use thiserror::Error;

use crate::store::UserId;

pub use claims::Claims;
pub use jwt::JwtCredentials;

/// Failures raised while issuing or validating a credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token subject is not a user id: {0}")]
    InvalidSubject(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues credentials for a resolved user. Used only by login.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: UserId) -> Result<String, CredentialError>;
}

/// Checks a presented credential's signature and expiry, yielding its subject.
pub trait TokenVerifier: Send + Sync {
    fn validate(&self, token: &str) -> Result<UserId, CredentialError>;
}

//! JWT claims embedded in every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::UserId;

use super::CredentialError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user id, as a string.
    pub sub: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Claims naming `user`, valid from `issued_at` until `expires_at`.
    pub fn new(user: UserId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Result<UserId, CredentialError> {
        self.sub
            .parse()
            .map_err(|_| CredentialError::InvalidSubject(self.sub.clone()))
    }
}

//! HS256 JWT issuance and validation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AuthConfig;
use crate::store::UserId;

use super::{Claims, CredentialError, TokenIssuer, TokenVerifier};

/// Signs and verifies access tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct JwtCredentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for JwtCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCredentials")
            .field("ttl", &self.ttl)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtCredentials {
    /// HS256 credentials signed with `secret`, issued for `ttl`.
    pub fn new(secret: &str, ttl: Duration, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Build from the `[auth]` config section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::from_secs(config.token_ttl_secs),
            config.leeway_secs,
        )
    }

    /// Issue a token with an explicit expiry.
    pub fn issue_expiring_at(
        &self,
        user: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let claims = Claims::new(user, Utc::now(), expires_at);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Decode and verify a token, returning its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, CredentialError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Invalid(e.to_string()),
            })
    }
}

impl TokenIssuer for JwtCredentials {
    fn issue(&self, user: UserId) -> Result<String, CredentialError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| CredentialError::Signing(e.to_string()))?;
        self.issue_expiring_at(user, Utc::now() + ttl)
    }
}

impl TokenVerifier for JwtCredentials {
    fn validate(&self, token: &str) -> Result<UserId, CredentialError> {
        self.decode(token)?.user_id()
    }
}

//! Authentication gate.
//!
//! Resolves the bearer credential to a user and attaches it to the request
//! context. The first failing step decides the response:
//!
//! | Step                                   | Response |
//! |----------------------------------------|----------|
//! | no `Authorization` header              | 401      |
//! | bad signature, malformed or expired    | 403      |
//! | subject not a resolvable user id       | 401      |
//! | directory failure                      | 500      |

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;

use crate::auth::{CredentialError, TokenVerifier};
use crate::http::chain::Interceptor;
use crate::http::handler::Handler;
use crate::http::response::{reject, ApiError};
use crate::observability::{metrics, AccessLog};
use crate::store::{LookupError, UserDirectory};

pub struct Authenticate {
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserDirectory>,
    log: Arc<dyn AccessLog>,
}

impl Authenticate {
    /// Create the gate over a verifier and a user directory.
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserDirectory>,
        log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            verifier,
            users,
            log,
        }
    }
}

impl Interceptor for Authenticate {
    fn wrap(&self, next: Handler) -> Handler {
        let verifier = self.verifier.clone();
        let users = self.users.clone();
        let log = self.log.clone();
        Handler::new(move |ctx, request| {
            let next = next.clone();
            let users = users.clone();
            let log = log.clone();

            // Header and signature checks are synchronous; only the
            // directory lookup suspends.
            let subject = match request.headers().get(AUTHORIZATION) {
                None => Err(missing_header()),
                Some(value) if value.is_empty() => Err(missing_header()),
                Some(value) => match value.to_str() {
                    Err(_) => Err((
                        ApiError::Forbidden("malformed authorization header".to_string()),
                        "invalid_token",
                    )),
                    Ok(raw) => {
                        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
                        verifier.validate(token).map_err(|e| match e {
                            CredentialError::Expired => (
                                ApiError::Forbidden("token has expired".to_string()),
                                "invalid_token",
                            ),
                            // Well signed, but names nobody the directory can resolve.
                            CredentialError::InvalidSubject(_) => (
                                ApiError::Unauthenticated("permission denied".to_string()),
                                "unknown_user",
                            ),
                            other => (
                                ApiError::Forbidden(format!("error validating token: {other}")),
                                "invalid_token",
                            ),
                        })
                    }
                },
            };

            async move {
                let subject = match subject {
                    Ok(subject) => subject,
                    Err((e, reason)) => {
                        metrics::record_auth_rejection(reason);
                        return reject(log.as_ref(), &ctx, e);
                    }
                };

                let user = match users.find_by_id(subject).await {
                    Ok(user) => user,
                    Err(LookupError::NotFound) => {
                        metrics::record_auth_rejection("unknown_user");
                        return reject(
                            log.as_ref(),
                            &ctx,
                            ApiError::Unauthenticated("permission denied".to_string()),
                        );
                    }
                    Err(e) => {
                        return reject(log.as_ref(), &ctx, ApiError::Internal(e.to_string()));
                    }
                };

                next.run(ctx.with_user(user.id), request).await
            }
        })
    }
}

fn missing_header() -> (ApiError, &'static str) {
    (
        ApiError::Unauthenticated("missing authorization header".to_string()),
        "missing_header",
    )
}

//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID from the OS random source
//! - Attach it to the request context before anything else runs
//! - Echo it in the `X-Request-ID` response header
//!
//! # Design Decisions
//! - Request ID added as early as possible: this interceptor goes first
//! - Fail closed: no random bytes means no request

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::http::chain::Interceptor;
use crate::http::handler::Handler;
use crate::http::response::{reject, ApiError};
use crate::observability::AccessLog;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const REQUEST_ID_PREFIX: &str = "req_";
const REQUEST_ID_BYTES: usize = 8;

/// Opaque per-request identifier, e.g. `req_9f86d081884c7d65`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Build an id from raw random bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut id = String::with_capacity(REQUEST_ID_PREFIX.len() + bytes.len() * 2);
        id.push_str(REQUEST_ID_PREFIX);
        for byte in bytes {
            id.push_str(&format!("{byte:02x}"));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
#[error("error generating request ID: {0}")]
pub struct IdError(String);

impl IdError {
    /// Wrap the reason the source could not produce an id.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Source of request ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> Result<RequestId, IdError>;
}

/// Draws request ids from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngIds;

impl IdSource for OsRngIds {
    fn next_id(&self) -> Result<RequestId, IdError> {
        let mut bytes = [0u8; REQUEST_ID_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IdError::new(e.to_string()))?;
        Ok(RequestId::from_bytes(&bytes))
    }
}

/// Assigns the request id. Must be the first interceptor of every chain.
pub struct AssignRequestId {
    ids: Arc<dyn IdSource>,
    log: Arc<dyn AccessLog>,
}

impl AssignRequestId {
    /// Draw ids from `ids`; failures are written to `log`.
    pub fn new(ids: Arc<dyn IdSource>, log: Arc<dyn AccessLog>) -> Self {
        Self { ids, log }
    }
}

impl Interceptor for AssignRequestId {
    fn wrap(&self, next: Handler) -> Handler {
        let ids = self.ids.clone();
        let log = self.log.clone();
        Handler::new(move |ctx, request| {
            let next = next.clone();
            let generated = ids.next_id();
            let log = log.clone();
            async move {
                let id = match generated {
                    Ok(id) => id,
                    Err(e) => return reject(log.as_ref(), &ctx, ApiError::Internal(e.to_string())),
                };

                let header = HeaderValue::from_str(id.as_str());
                let mut response = next.run(ctx.with_request_id(id), request).await;
                if let Ok(value) = header {
                    response.headers_mut().insert(X_REQUEST_ID, value);
                }
                response
            }
        })
    }
}

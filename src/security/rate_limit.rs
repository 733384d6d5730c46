//! Rate-limit admission interceptor.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::Utc;

use crate::http::chain::Interceptor;
use crate::http::handler::Handler;
use crate::http::response::{reject, ApiError};
use crate::observability::{metrics, AccessLog};
use crate::security::token_bucket::TokenBucket;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admits requests through the shared [`TokenBucket`].
///
/// Each request waits for and takes a token, then reads the remaining count.
/// When the bucket is observed empty at that point the request is answered
/// with 429 and `Retry-After: 1`; otherwise it proceeds. Both outcomes carry
/// the `X-RateLimit-*` headers.
pub struct RateLimit {
    bucket: Arc<TokenBucket>,
    log: Arc<dyn AccessLog>,
}

impl RateLimit {
    /// Admit requests through `bucket`; refusals are written to `log`.
    pub fn new(bucket: Arc<TokenBucket>, log: Arc<dyn AccessLog>) -> Self {
        Self { bucket, log }
    }
}

impl Interceptor for RateLimit {
    fn wrap(&self, next: Handler) -> Handler {
        let bucket = self.bucket.clone();
        let log = self.log.clone();
        Handler::new(move |ctx, request| {
            let next = next.clone();
            let bucket = bucket.clone();
            let log = log.clone();
            async move {
                bucket.consume().await;

                let remaining = bucket.available();
                metrics::record_tokens_available(remaining);
                let reset = Utc::now().timestamp() + 1;

                let mut response = if remaining == 0 {
                    metrics::record_rate_limited();
                    reject(log.as_ref(), &ctx, ApiError::RateLimited)
                } else {
                    next.run(ctx, request).await
                };

                set_limit_headers(response.headers_mut(), bucket.capacity(), remaining, reset);
                response
            }
        })
    }
}

fn set_limit_headers(headers: &mut HeaderMap, limit: usize, remaining: usize, reset: i64) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset));
}

//! Response construction and error mapping.
//!
//! Every rejection in the pipeline goes through [`reject`], which logs the
//! failure once and renders the JSON error body.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::observability::{AccessLog, LogEntry, LogLevel};

/// Error categories a request can be rejected with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The admission bucket was observed empty.
    #[error("rate limit exceeded, please wait before making more requests")]
    RateLimited,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this category.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn level(&self) -> LogLevel {
        match self {
            ApiError::Unauthenticated(_) | ApiError::NotFound(_) => LogLevel::Info,
            ApiError::RateLimited | ApiError::Forbidden(_) | ApiError::BadRequest(_) => {
                LogLevel::Warn
            }
            ApiError::Internal(_) => LogLevel::Error,
        }
    }
}

/// Standard API error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let rate_limited = self == ApiError::RateLimited;
        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response();

        if rate_limited {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

/// Log `error` against the request and turn it into the response.
pub fn reject(log: &dyn AccessLog, ctx: &RequestContext, error: ApiError) -> Response {
    log.record(&LogEntry::new(
        error.level(),
        error.to_string(),
        ctx,
        error.status(),
    ));
    error.into_response()
}

/// Log a successful request and render `body` as JSON with `200 OK`.
pub fn respond<T: Serialize>(log: &dyn AccessLog, ctx: &RequestContext, body: T) -> Response {
    log.record(&LogEntry::new(
        LogLevel::Info,
        "Request successful",
        ctx,
        StatusCode::OK,
    ));
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    use crate::observability::MemoryAccessLog;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retry_after_only_when_rate_limited() {
        let limited = ApiError::RateLimited.into_response();
        assert_eq!(limited.headers()[header::RETRY_AFTER], "1");

        let forbidden = ApiError::Forbidden("no".into()).into_response();
        assert!(forbidden.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_reject_logs_once() {
        let log = MemoryAccessLog::new();
        let ctx = RequestContext::new(Method::POST, "/api/v1/add");

        let response = reject(&log, &ctx, ApiError::Unauthenticated("missing".into()));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].status_code, 401);
        assert_eq!(entries[0].message, "missing");
        assert_eq!(entries[0].path, "/api/v1/add");
    }
}

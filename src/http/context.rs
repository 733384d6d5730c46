//! Per-request metadata threaded through every interceptor.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::{Method, Request};

use crate::http::request::RequestId;
use crate::store::UserId;

/// Metadata owned by one request's call graph.
///
/// Created at the pipeline entry from the raw request, then filled in by
/// interceptors: the request id by the first one, the user id by the
/// authentication gate. Each interceptor receives it by value and hands it on.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Option<RequestId>,
    user_id: Option<UserId>,
    method: Method,
    path: String,
    remote_addr: Option<SocketAddr>,
    received_at: Instant,
}

impl RequestContext {
    /// Create a context with no request id, user or peer yet.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: None,
            user_id: None,
            method,
            path: path.into(),
            remote_addr: None,
            received_at: Instant::now(),
        }
    }

    /// Capture method, path and peer address from an inbound request.
    ///
    /// Nested routers strip their prefix from the URI, so the path comes from
    /// [`OriginalUri`] when the router recorded one.
    pub fn from_request(request: &Request<Body>) -> Self {
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.path())
            .unwrap_or_else(|| request.uri().path());
        let mut ctx = Self::new(request.method().clone(), path);
        ctx.remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        ctx
    }

    /// Attach the request id. The first id assigned is kept.
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        if self.request_id.is_none() {
            self.request_id = Some(id);
        }
        self
    }

    /// Attach the authenticated caller.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    /// Assigned by the first interceptor of every chain.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Set only once the authentication gate has resolved the caller.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Time since the request entered the pipeline.
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_assigned_once() {
        let ctx = RequestContext::new(Method::POST, "/api/v1/add")
            .with_request_id(RequestId::from_bytes(&[0x01]))
            .with_request_id(RequestId::from_bytes(&[0x02]));
        assert_eq!(ctx.request_id().unwrap().as_str(), "req_01");
    }

    #[test]
    fn test_from_request_reads_peer() {
        let addr: SocketAddr = "10.0.0.1:4242".parse().unwrap();
        let mut request = Request::post("/api/v1/sum").body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.remote_addr(), Some(addr));
        assert_eq!(ctx.path(), "/api/v1/sum");
        assert_eq!(ctx.method(), Method::POST);
        assert!(ctx.request_id().is_none());
        assert!(ctx.user_id().is_none());
    }

    #[test]
    fn test_from_request_prefers_original_uri() {
        let mut request = Request::post("/add").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(OriginalUri("/api/v1/add?x=1".parse().unwrap()));

        assert_eq!(RequestContext::from_request(&request).path(), "/api/v1/add");
    }
}

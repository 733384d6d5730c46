//! The handler type every interceptor wraps.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::{BoxFuture, FutureExt};
use tower::Service;

use crate::http::context::RequestContext;

pub type HandlerFuture = BoxFuture<'static, Response>;

type HandlerFn = dyn Fn(RequestContext, Request<Body>) -> HandlerFuture + Send + Sync;

/// An async request handler taking the typed context alongside the request.
///
/// Cloning is cheap. As a [`tower::Service`] it builds the context from the
/// raw request, so a composed handler can be mounted directly on an axum
/// route.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async closure as a handler.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext, Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |ctx: RequestContext, request: Request<Body>| {
                f(ctx, request).boxed()
            }),
        }
    }

    /// Invoke the handler with an explicit context.
    pub fn run(&self, ctx: RequestContext, request: Request<Body>) -> HandlerFuture {
        (self.inner)(ctx, request)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Service<Request<Body>> for Handler {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let ctx = RequestContext::from_request(&request);
        let response = self.run(ctx, request);
        async move { Ok(response.await) }.boxed()
    }
}

//! HTTP server setup.
//!
//! # Responsibilities
//! - Compose the interceptor chains (public and authenticated)
//! - Mount the API handlers behind them on an Axum router
//! - Own the admission bucket and start its refill task
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get_service, post_service};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{TokenIssuer, TokenVerifier};
use crate::calculator::OperationKind;
use crate::config::CalculatorConfig;
use crate::http::chain::{build_chain, Chain, Interceptor};
use crate::http::handlers::{not_found, Api};
use crate::http::middleware::RequestLogger;
use crate::http::request::{AssignRequestId, IdSource};
use crate::lifecycle::Shutdown;
use crate::observability::AccessLog;
use crate::security::{Authenticate, BucketError, RateLimit, TokenBucket};
use crate::store::{OperationStore, UserDirectory};

/// External collaborators the server is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub operations: Arc<dyn OperationStore>,
    pub log: Arc<dyn AccessLog>,
    pub ids: Arc<dyn IdSource>,
}

/// Build the router.
///
/// Every route runs behind request id assignment, request logging and rate
/// limiting, in that order. All routes except `/login` additionally run the
/// authentication gate last.
pub fn build_router(config: &CalculatorConfig, bucket: Arc<TokenBucket>, c: &Collaborators) -> Router {
    let public = build_chain([
        Arc::new(AssignRequestId::new(c.ids.clone(), c.log.clone())) as Arc<dyn Interceptor>,
        Arc::new(RequestLogger::new(c.log.clone())),
        Arc::new(RateLimit::new(bucket, c.log.clone())),
    ]);
    let protected: Chain = public.clone().with(Authenticate::new(
        c.verifier.clone(),
        c.users.clone(),
        c.log.clone(),
    ));

    let api = Api::new(
        c.users.clone(),
        c.issuer.clone(),
        c.operations.clone(),
        c.log.clone(),
    );
    let op = |kind| post_service(protected.then(api.operation(kind)));

    let v1 = Router::new()
        .route("/login", post_service(public.then(api.login())))
        .route("/add", op(OperationKind::Add))
        .route("/subtract", op(OperationKind::Subtract))
        .route("/substract", op(OperationKind::Subtract))
        .route("/multiply", op(OperationKind::Multiply))
        .route("/divide", op(OperationKind::Divide))
        .route("/sum", op(OperationKind::Sum))
        .route("/operations", get_service(protected.then(api.history())));

    Router::new()
        .nest("/api/v1", v1)
        .fallback_service(public.then(not_found(c.log.clone())))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for the calculator API.
pub struct HttpServer {
    router: Router,
    bucket: Arc<TokenBucket>,
}

impl HttpServer {
    /// Build the bucket from `config.rate_limit` and compose the router.
    pub fn new(config: CalculatorConfig, collaborators: Collaborators) -> Result<Self, BucketError> {
        let bucket = Arc::new(TokenBucket::new(
            config.rate_limit.capacity,
            config.rate_limit.refill_rate,
        )?);
        let router = build_router(&config, bucket.clone(), &collaborators);
        Ok(Self { router, bucket })
    }

    /// The composed router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The admission bucket shared by every route.
    pub fn bucket(&self) -> Arc<TokenBucket> {
        self.bucket.clone()
    }

    /// Start the refill task and serve until `shutdown` fires.
    ///
    /// Requests still waiting for a token when `shutdown` fires are drained,
    /// so the refill task keeps running until the server has stopped.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let refill_stop = Shutdown::new();
        let refill = self
            .bucket
            .start(refill_stop.subscribe())
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        tracing::info!(
            address = %addr,
            capacity = self.bucket.capacity(),
            refill_interval_ms = self.bucket.refill_interval().as_millis() as u64,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut stop = shutdown.subscribe();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await;

        refill_stop.trigger();
        if let Err(e) = refill.await {
            tracing::warn!(error = %e, "Refill task ended abnormally");
        }
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

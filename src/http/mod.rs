//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, route table)
//!     → handler.rs (raw request → RequestContext + request)
//!     → chain.rs (interceptors in declaration order):
//!         request.rs (assign request ID)
//!         middleware/logger.rs (one log entry per request)
//!         security (rate limit, then authentication on protected routes)
//!     → handlers.rs (login, arithmetic, history)
//!     → response.rs (JSON body, error mapping)
//!     → Send to client
//! ```

pub mod chain;
pub mod context;
pub mod handler;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use chain::{build_chain, Chain, Interceptor};
pub use context::RequestContext;
pub use handler::Handler;
pub use request::{IdError, IdSource, OsRngIds, RequestId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, Collaborators, HttpServer};

//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after request id and logging):
//!     → rate_limit.rs (take a token from the shared bucket, 429 when empty)
//!     → auth.rs (bearer credential → user, protected routes only)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - One global bucket shared by every route
//! - Fail closed: reject on any authentication failure
//! - No trust in client input

pub mod auth;
pub mod rate_limit;
pub mod token_bucket;

pub use auth::Authenticate;
pub use rate_limit::RateLimit;
pub use token_bucket::{BucketError, TokenBucket};

//! Interceptors that are not security checks.

pub mod logger;

pub use logger::RequestLogger;

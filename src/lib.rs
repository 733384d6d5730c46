//! Calculator API library

pub mod auth;
pub mod calculator;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;

pub use config::CalculatorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

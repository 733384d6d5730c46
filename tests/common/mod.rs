//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use calculator_api::auth::{JwtCredentials, TokenIssuer};
use calculator_api::config::CalculatorConfig;
use calculator_api::http::{Collaborators, HttpServer, IdError, IdSource, OsRngIds, RequestId};
use calculator_api::observability::MemoryAccessLog;
use calculator_api::security::TokenBucket;
use calculator_api::store::{MemoryOperationStore, MemoryUserDirectory, User, UserId};

pub const SECRET: &str = "integration-secret";

/// An id source that always fails.
pub struct FailingIds;

impl IdSource for FailingIds {
    fn next_id(&self) -> Result<RequestId, IdError> {
        Err(IdError::new("entropy source unavailable"))
    }
}

/// A fully wired server plus handles on its in-memory collaborators.
pub struct TestApp {
    pub server: HttpServer,
    pub log: Arc<MemoryAccessLog>,
    pub credentials: Arc<JwtCredentials>,
    pub users: Arc<MemoryUserDirectory>,
    pub operations: Arc<MemoryOperationStore>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.server.router()
    }

    pub fn bucket(&self) -> Arc<TokenBucket> {
        self.server.bucket()
    }

    /// A valid token for `user`.
    pub fn token(&self, user: i64) -> String {
        self.credentials.issue(UserId(user)).unwrap()
    }
}

pub fn config(capacity: usize) -> CalculatorConfig {
    let mut config = CalculatorConfig::default();
    config.rate_limit.capacity = capacity;
    config.rate_limit.refill_rate = 10;
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.leeway_secs = 0;
    config
}

pub fn test_app(config: CalculatorConfig) -> TestApp {
    build(config, Arc::new(OsRngIds))
}

pub fn test_app_with_ids(config: CalculatorConfig, ids: Arc<dyn IdSource>) -> TestApp {
    build(config, ids)
}

fn build(config: CalculatorConfig, ids: Arc<dyn IdSource>) -> TestApp {
    let log = Arc::new(MemoryAccessLog::new());
    let credentials = Arc::new(JwtCredentials::new(
        &config.auth.jwt_secret,
        Duration::from_secs(config.auth.token_ttl_secs),
        config.auth.leeway_secs,
    ));
    let users = Arc::new(MemoryUserDirectory::new());
    users.insert(User {
        id: UserId(1),
        pseudo: "p4p1".to_string(),
    });
    users.insert(User {
        id: UserId(2),
        pseudo: "ada".to_string(),
    });
    let operations = Arc::new(MemoryOperationStore::new(None));

    let collaborators = Collaborators {
        users: users.clone(),
        issuer: credentials.clone(),
        verifier: credentials.clone(),
        operations: operations.clone(),
        log: log.clone(),
        ids,
    };

    TestApp {
        server: HttpServer::new(config, collaborators).unwrap(),
        log,
        credentials,
        users,
        operations,
    }
}

pub fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//! In-process tests of the full interceptor pipeline.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use calculator_api::auth::Claims;
use calculator_api::http::X_REQUEST_ID;
use calculator_api::observability::LogLevel;
use calculator_api::store::{OperationStore, UserId};

mod common;

use common::{
    body_json, config, get, post_json, test_app, test_app_with_ids, FailingIds, SECRET,
};

#[tokio::test]
async fn test_missing_authorization_is_unauthenticated() {
    let app = test_app(config(10));

    let response = app
        .router()
        .oneshot(post_json("/api/v1/add", None, r#"{"number1":1,"number2":2}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "missing authorization header");

    // the handler never ran
    assert!(app.operations.history(UserId(1)).await.unwrap().is_empty());
    let entries = app.log.entries();
    assert!(entries.iter().all(|e| e.message != "Request successful"));
    let rejection = entries.iter().find(|e| e.status_code == 401).unwrap();
    assert_eq!(rejection.level, LogLevel::Info);
}

#[tokio::test]
async fn test_expired_token_is_forbidden() {
    let app = test_app(config(10));
    let token = app
        .credentials
        .issue_expiring_at(UserId(1), Utc::now() - chrono::Duration::hours(1))
        .unwrap();

    let response = app
        .router()
        .oneshot(post_json("/api/v1/add", Some(&token), r#"{"number1":1,"number2":2}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tampered_token_is_forbidden() {
    let app = test_app(config(10));
    let token = format!("{}x", app.token(1));

    let response = app
        .router()
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let rejection = app.log.entries().into_iter().find(|e| e.status_code == 403).unwrap();
    assert_eq!(rejection.level, LogLevel::Warn);
}

#[tokio::test]
async fn test_unknown_subject_is_unauthenticated() {
    let app = test_app(config(10));
    let token = app.token(99);

    let response = app
        .router()
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "permission denied");
}

#[tokio::test]
async fn test_non_numeric_subject_is_unauthenticated() {
    let app = test_app(config(10));
    let now = Utc::now();
    let claims = Claims {
        sub: "alice".to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .router()
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "permission denied");
}

#[tokio::test]
async fn test_removed_user_loses_access() {
    let app = test_app(config(10));
    let token = app.token(2);
    app.users.remove(UserId(2));

    let response = app
        .router()
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_bearer_prefix_is_accepted() {
    let app = test_app(config(10));
    let request = axum::http::Request::builder()
        .uri("/api/v1/operations")
        .header(header::AUTHORIZATION, app.token(1))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_header_matches_log_entries() {
    let app = test_app(config(10));
    let token = app.token(1);

    let response = app
        .router()
        .oneshot(post_json("/api/v1/add", Some(&token), r#"{"number1":1,"number2":2}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
    assert!(request_id.starts_with("req_"));

    let entries = app.log.entries();
    assert!(!entries.is_empty());
    assert!(entries
        .iter()
        .all(|e| e.request_id.as_deref() == Some(request_id.as_str())));

    // paths are logged as the client sent them, prefix included
    assert!(entries.iter().all(|e| e.path == "/api/v1/add"));

    let success = entries
        .iter()
        .find(|e| e.message == "Request successful")
        .unwrap();
    assert_eq!(success.user_id, Some(UserId(1)));
    assert!(app.log.for_request(&request_id).iter().any(|e| e.duration.is_some()));
}

#[tokio::test]
async fn test_each_request_gets_its_own_id() {
    let app = test_app(config(10));
    let router = app.router();

    let a = router.clone().oneshot(get("/api/v1/nowhere", None)).await.unwrap();
    let b = router.oneshot(get("/api/v1/nowhere", None)).await.unwrap();
    assert_ne!(a.headers()[X_REQUEST_ID], b.headers()[X_REQUEST_ID]);
}

#[tokio::test]
async fn test_rate_limit_refuses_when_bucket_observed_empty() {
    let app = test_app(config(2));
    let router = app.router();
    let token = app.token(1);

    let first = router
        .clone()
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-limit"], "2");
    assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

    let second = router
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()[header::RETRY_AFTER], "1");
    assert_eq!(second.headers()["x-ratelimit-remaining"], "0");
    assert!(second.headers().contains_key("x-ratelimit-reset"));
    assert!(second.headers().contains_key(X_REQUEST_ID));

    assert_eq!(app.bucket().available(), 0);
}

#[tokio::test]
async fn test_rate_limit_runs_before_authentication() {
    let app = test_app(config(1));

    let response = app
        .router()
        .oneshot(post_json("/api/v1/add", None, r#"{"number1":1,"number2":2}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(app.log.entries().iter().all(|e| e.status_code != 401));
}

#[tokio::test]
async fn test_failing_id_source_fails_closed() {
    let app = test_app_with_ids(config(10), Arc::new(FailingIds));
    let token = app.token(1);

    let response = app
        .router()
        .oneshot(post_json("/api/v1/add", Some(&token), r#"{"number1":1,"number2":2}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.headers().contains_key(X_REQUEST_ID));
    assert!(app.operations.history(UserId(1)).await.unwrap().is_empty());

    // nothing downstream ran, not even admission
    assert_eq!(app.bucket().available(), 10);
    let entries = app.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Error);
}

#[tokio::test]
async fn test_login_then_calculate_then_history() {
    let app = test_app(config(20));
    let router = app.router();

    let login = router
        .clone()
        .oneshot(post_json("/api/v1/login", None, r#"{"pseudo":"ada"}"#))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let token = body_json(login).await["token"].as_str().unwrap().to_string();

    let calls = [
        ("/api/v1/add", r#"{"number1":2,"number2":3}"#, 5.0),
        ("/api/v1/subtract", r#"{"number1":2,"number2":3}"#, -1.0),
        ("/api/v1/substract", r#"{"number1":10,"number2":4}"#, 6.0),
        ("/api/v1/multiply", r#"{"number1":2.5,"number2":4}"#, 10.0),
        ("/api/v1/divide", r#"{"number1":9,"number2":3}"#, 3.0),
        ("/api/v1/sum", "[1, 2, 3, 4]", 10.0),
    ];
    for (uri, body, expected) in calls {
        let response = router
            .clone()
            .oneshot(post_json(uri, Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_json(response).await["result"], expected, "{uri}");
    }

    let history = router
        .oneshot(get("/api/v1/operations", Some(&token)))
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let records = body_json(history).await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 6);
    assert_eq!(records[0]["type"], "add");
    assert_eq!(records[1]["type"], "substract");
    assert_eq!(records[5]["inputs"].as_array().unwrap().len(), 4);
    assert!(records.iter().all(|r| r["user_id"] == 2));

    assert!(app.operations.history(UserId(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_handler_errors_are_bad_requests() {
    let app = test_app(config(10));
    let router = app.router();
    let token = app.token(1);

    let divide = router
        .clone()
        .oneshot(post_json("/api/v1/divide", Some(&token), r#"{"number1":1,"number2":0}"#))
        .await
        .unwrap();
    assert_eq!(divide.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(divide).await["error"], "division by zero is prohibited");

    let sum = router
        .clone()
        .oneshot(post_json("/api/v1/sum", Some(&token), "[]"))
        .await
        .unwrap();
    assert_eq!(sum.status(), StatusCode::BAD_REQUEST);

    let garbage = router
        .oneshot(post_json("/api/v1/add", Some(&token), "nope"))
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unmatched_route_is_not_found() {
    let app = test_app(config(10));

    let response = app
        .router()
        .oneshot(get("/api/v2/add", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(body_json(response).await["error"], "route not found");
}

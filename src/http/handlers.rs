//! Terminal handlers of the calculator API.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::FromRequest;
use axum::http::Request;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::TokenIssuer;
use crate::calculator::{evaluate, OperationKind};
use crate::http::context::RequestContext;
use crate::http::handler::Handler;
use crate::http::response::{reject, respond, ApiError};
use crate::observability::AccessLog;
use crate::store::{LookupError, NewOperation, OperationStore, UserDirectory, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub pseudo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

/// Operands of the binary operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Payload {
    pub number1: f64,
    pub number2: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResultBody {
    pub result: f64,
}

/// Everything the handlers need, shared across routes.
#[derive(Clone)]
pub struct Api {
    users: Arc<dyn UserDirectory>,
    issuer: Arc<dyn TokenIssuer>,
    operations: Arc<dyn OperationStore>,
    log: Arc<dyn AccessLog>,
}

impl Api {
    /// Create the handler set over the given collaborators.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        issuer: Arc<dyn TokenIssuer>,
        operations: Arc<dyn OperationStore>,
        log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            users,
            issuer,
            operations,
            log,
        }
    }

    /// `POST /login`: exchange a pseudo for an access token.
    pub fn login(&self) -> Handler {
        let api = self.clone();
        Handler::new(move |ctx, request| {
            let api = api.clone();
            async move {
                match api.issue_token(request).await {
                    Ok(token) => respond(api.log.as_ref(), &ctx, TokenBody { token }),
                    Err(e) => reject(api.log.as_ref(), &ctx, e),
                }
            }
        })
    }

    /// `POST /<kind>`: evaluate and record one operation for the caller.
    pub fn operation(&self, kind: OperationKind) -> Handler {
        let api = self.clone();
        Handler::new(move |ctx, request| {
            let api = api.clone();
            async move {
                match api.calculate(&ctx, kind, request).await {
                    Ok(result) => respond(api.log.as_ref(), &ctx, ResultBody { result }),
                    Err(e) => reject(api.log.as_ref(), &ctx, e),
                }
            }
        })
    }

    /// `GET /operations`: the caller's history, oldest first.
    pub fn history(&self) -> Handler {
        let api = self.clone();
        Handler::new(move |ctx, _request| {
            let api = api.clone();
            async move {
                let history = match caller(&ctx) {
                    Ok(user) => api
                        .operations
                        .history(user)
                        .await
                        .map_err(|e| ApiError::Internal(e.to_string())),
                    Err(e) => Err(e),
                };
                match history {
                    Ok(records) => respond(api.log.as_ref(), &ctx, records),
                    Err(e) => reject(api.log.as_ref(), &ctx, e),
                }
            }
        })
    }

    async fn issue_token(&self, request: Request<Body>) -> Result<String, ApiError> {
        let LoginPayload { pseudo } = parse_json(request).await?;
        let pseudo = pseudo.trim();
        if pseudo.is_empty() {
            return Err(ApiError::BadRequest("pseudo should not be empty".to_string()));
        }

        let user = self.users.find_by_pseudo(pseudo).await.map_err(|e| match e {
            LookupError::NotFound => ApiError::BadRequest(format!("unknown pseudo {pseudo}")),
            other => ApiError::Internal(other.to_string()),
        })?;

        self.issuer
            .issue(user.id)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    async fn calculate(
        &self,
        ctx: &RequestContext,
        kind: OperationKind,
        request: Request<Body>,
    ) -> Result<f64, ApiError> {
        let user_id = caller(ctx)?;

        let inputs = match kind {
            OperationKind::Sum => parse_json::<Vec<f64>>(request).await?,
            _ => {
                let Payload { number1, number2 } = parse_json(request).await?;
                vec![number1, number2]
            }
        };

        let result = evaluate(kind, &inputs).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        self.operations
            .record(NewOperation {
                user_id,
                kind,
                inputs,
                result,
            })
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(result)
    }
}

/// The authenticated caller. Protected routes always run behind the
/// authentication gate, so a missing user is a wiring fault.
fn caller(ctx: &RequestContext) -> Result<UserId, ApiError> {
    ctx.user_id()
        .ok_or_else(|| ApiError::Internal("no authenticated user on request".to_string()))
}

async fn parse_json<T: DeserializeOwned>(request: Request<Body>) -> Result<T, ApiError> {
    Json::<T>::from_request(request, &())
        .await
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Fallback for unmatched routes.
pub fn not_found(log: Arc<dyn AccessLog>) -> Handler {
    Handler::new(move |ctx, _request| {
        let log = log.clone();
        async move { reject(log.as_ref(), &ctx, ApiError::NotFound("route not found".to_string())) }
    })
}

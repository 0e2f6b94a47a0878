//! JSON endpoints for regulated loads and saves, plus session issuance.
//!
//! Load and save follow the same pipeline: authenticate the bearer token,
//! enforce against the principal's effective metadata, then hand the
//! regulated request to the executor. Rejections never reach the executor.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use dsoguard_core::error::{ClientCode, GuardError};
use dsoguard_core::protocol::{LoadRequest, SaveRequest};
use dsoguard_core::Principal;

use crate::app_state::AppState;
use crate::config::SessionSeed;
use crate::context::authenticate;

/// Error returned by every gateway endpoint.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub GuardError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
            ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
            ClientCode::NotPermitted => StatusCode::FORBIDDEN,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::Misconfigured | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(GuardError::BadRequest(rejection.body_text()))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            GuardError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.0.client_code().as_str(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

const ROUTE_LOAD: &str = "load";
const ROUTE_SAVE: &str = "save";
const ROUTE_SESSION: &str = "session";

fn rejected(state: &AppState, route: &str, err: GuardError) -> ApiError {
    state
        .metrics()
        .rejections
        .inc(&[("route", route), ("code", err.client_code().as_str())]);
    ApiError(err)
}

pub async fn load(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoadRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.metrics().requests.inc(&[("route", ROUTE_LOAD)]);

    let principal =
        authenticate(state.sessions(), &headers).map_err(|e| rejected(&state, ROUTE_LOAD, e))?;
    let Json(request) = body.map_err(|r| rejected(&state, ROUTE_LOAD, ApiError::from(r).0))?;

    let started = Instant::now();
    let loader = state.catalog().loader_for(principal.as_ref());
    let regulated = state
        .enforcer()
        .enforce_load(request, principal.as_ref(), &loader);
    state
        .metrics()
        .enforce_duration
        .observe(&[("route", ROUTE_LOAD)], started.elapsed());
    let regulated = regulated.map_err(|e| rejected(&state, ROUTE_LOAD, e))?;

    for (model, dropped) in regulated.operation_models.iter().zip(&regulated.dropped) {
        if !dropped.is_empty() {
            state.metrics().dropped_fields.add(
                &[("entity", model.object_name.as_str())],
                dropped.len() as u64,
            );
        }
    }
    tracing::debug!(
        models = regulated.operation_models.len(),
        dropped = regulated.dropped_count(),
        "load regulated"
    );

    let executor = state.executor();
    executor.load(regulated).await.map(Json).map_err(|e| {
        state
            .metrics()
            .executor_errors
            .inc(&[("route", ROUTE_LOAD), ("executor", executor.name())]);
        ApiError(e)
    })
}

pub async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.metrics().requests.inc(&[("route", ROUTE_SAVE)]);

    let principal =
        authenticate(state.sessions(), &headers).map_err(|e| rejected(&state, ROUTE_SAVE, e))?;
    let Json(request) = body.map_err(|r| rejected(&state, ROUTE_SAVE, ApiError::from(r).0))?;

    let started = Instant::now();
    let loader = state.catalog().loader_for(principal.as_ref());
    let regulated = state
        .enforcer()
        .enforce_save(request, principal.as_ref(), &loader);
    state
        .metrics()
        .enforce_duration
        .observe(&[("route", ROUTE_SAVE)], started.elapsed());
    let regulated = regulated.map_err(|e| rejected(&state, ROUTE_SAVE, e))?;
    tracing::debug!(operations = regulated.operations.len(), "save regulated");

    let executor = state.executor();
    executor.save(regulated).await.map(Json).map_err(|e| {
        state
            .metrics()
            .executor_errors
            .inc(&[("route", ROUTE_SAVE), ("executor", executor.name())]);
        ApiError(e)
    })
}

/// Register a session that expires after `auth.session_ttl_secs`.
///
/// Only admin principals may issue sessions; this is the hook an upstream
/// identity service uses once it has authenticated a user.
pub async fn issue_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SessionSeed>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.metrics().requests.inc(&[("route", ROUTE_SESSION)]);

    let caller =
        authenticate(state.sessions(), &headers).map_err(|e| rejected(&state, ROUTE_SESSION, e))?;
    if !caller.is_admin() {
        let denied = GuardError::NotPermitted {
            operation: "Create",
            entity: "session".to_string(),
        };
        return Err(rejected(&state, ROUTE_SESSION, denied));
    }
    let Json(grant) = body.map_err(|r| rejected(&state, ROUTE_SESSION, ApiError::from(r).0))?;

    let token = grant.token.trim();
    if token.is_empty() {
        let err = GuardError::BadRequest("session token must not be empty".into());
        return Err(rejected(&state, ROUTE_SESSION, err));
    }
    let principal = grant.principal(&state.cfg().auth.admin_profile);
    if !state.sessions().insert(token, principal) {
        let err = GuardError::BadRequest("session token already in use".into());
        return Err(rejected(&state, ROUTE_SESSION, err));
    }

    let ttl = state.sessions().ttl().as_secs();
    tracing::info!(profile = %grant.profile, ttl_secs = ttl, "session issued");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "profile": grant.profile, "expiresInSecs": ttl })),
    ))
}

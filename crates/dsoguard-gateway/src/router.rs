//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/load", post(transport::http::load))
        .route("/v1/save", post(transport::http::save))
        .route("/v1/sessions", post(transport::http::issue_session))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}

//! Request context: resolving the authenticated principal.
//!
//! Authentication proper (token issuance, JWT checks) lives upstream; this
//! layer only maps a bearer token to an already-built principal.

pub mod session;

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use dsoguard_core::error::{GuardError, Result};
use dsoguard_core::UserInfo;

pub use session::SessionStore;

/// Extract `Authorization: Bearer <token>` and resolve it to a principal.
pub fn authenticate(sessions: &SessionStore, headers: &HeaderMap) -> Result<Arc<UserInfo>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(GuardError::AuthFailed)?;
    sessions.resolve(token)
}

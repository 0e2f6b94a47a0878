//! Shared error type across dsoguard crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// No authenticated principal.
    AuthFailed,
    /// Entity or field access denied for the operation.
    NotPermitted,
    /// Server-side metadata is broken (e.g. a userinfo condition).
    Misconfigured,
    /// Entity does not exist or is not visible.
    NotFound,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotPermitted => "NOT_PERMITTED",
            ClientCode::Misconfigured => "MISCONFIGURED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Unified error type used by the engine and the gateway.
///
/// The `NotPermitted` and `MisconfiguredCondition` messages are part of the
/// client contract and must not change.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("{operation} not permitted for model: {entity}")]
    NotPermitted {
        operation: &'static str,
        entity: String,
    },
    #[error("{operation} not permitted for field: {field} on model: {entity}")]
    FieldNotPermitted {
        operation: &'static str,
        entity: String,
        field: String,
    },
    #[error("condition {condition} references user field {field} which is not available")]
    MissingUserField { condition: String, field: String },
    #[error("Improperly Configured Condition on Object: {entity}. {reason}")]
    MisconfiguredCondition { entity: String, reason: String },
    #[error("invalid condition logic: {0}")]
    InvalidConditionLogic(String),
    #[error("no access: {0}")]
    NoAccess(String),
    #[error("entity not found: {0}")]
    EntityNotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl GuardError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GuardError::BadRequest(_) | GuardError::InvalidConditionLogic(_) => {
                ClientCode::BadRequest
            }
            GuardError::AuthFailed => ClientCode::AuthFailed,
            GuardError::NotPermitted { .. }
            | GuardError::FieldNotPermitted { .. }
            | GuardError::NoAccess(_) => ClientCode::NotPermitted,
            GuardError::MisconfiguredCondition { .. } | GuardError::MissingUserField { .. } => {
                ClientCode::Misconfigured
            }
            GuardError::EntityNotFound(_) => ClientCode::NotFound,
            GuardError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            GuardError::Internal(_) => ClientCode::Internal,
        }
    }

    pub(crate) fn no_access(entity: &str, field: &str) -> Self {
        GuardError::NoAccess(format!("{entity}.{field}"))
    }
}

//! Service-level failures and their JSON rendering.
//!
//! Every error body has the shape `{"error": "<code>", "message": "..."}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use smartstock_auth::{AuthzError, UnknownCapability};
use smartstock_core::DomainError;
use smartstock_infra::DispatchError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is not activated")]
    AccountNotActivated,

    /// Uniform denial; the missing capability only goes to the logs.
    #[error("permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidQuantity(String),

    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("sku '{0}' already exists")]
    DuplicateSku(String),

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("unknown sku '{0}'")]
    UnknownSku(String),

    #[error("unknown request '{0}'")]
    UnknownRequest(String),

    #[error("unknown purchase order '{0}'")]
    UnknownPurchaseOrder(String),

    #[error("insufficient stock (available: {available}, requested: {requested})")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("request has already been resolved")]
    AlreadyResolved,

    #[error("{0}")]
    InvalidStateTransition(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::AccountNotActivated => "account_not_activated",
            ServiceError::PermissionDenied => "permission_denied",
            ServiceError::Validation(_) => "validation",
            ServiceError::InvalidQuantity(_) => "invalid_quantity",
            ServiceError::UnknownCapability(_) => "unknown_capability",
            ServiceError::DuplicateUsername(_) => "duplicate_username",
            ServiceError::DuplicateEmail(_) => "duplicate_email",
            ServiceError::DuplicateSku(_) => "duplicate_sku",
            ServiceError::UnknownUser(_) => "unknown_user",
            ServiceError::UnknownSku(_) => "unknown_sku",
            ServiceError::UnknownRequest(_) => "unknown_request",
            ServiceError::UnknownPurchaseOrder(_) => "unknown_purchase_order",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::AlreadyResolved => "already_resolved",
            ServiceError::InvalidStateTransition(_) => "invalid_state_transition",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unauthenticated | ServiceError::InvalidCredentials | ServiceError::AccountNotActivated => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::PermissionDenied => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) | ServiceError::InvalidQuantity(_) | ServiceError::UnknownCapability(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::UnknownUser(_)
            | ServiceError::UnknownSku(_)
            | ServiceError::UnknownRequest(_)
            | ServiceError::UnknownPurchaseOrder(_) => StatusCode::NOT_FOUND,
            ServiceError::DuplicateUsername(_)
            | ServiceError::DuplicateEmail(_)
            | ServiceError::DuplicateSku(_)
            | ServiceError::AlreadyResolved
            | ServiceError::InvalidStateTransition(_)
            | ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a dispatch failure, naming the resource the command targeted.
    ///
    /// `on_missing` and `on_duplicate` build the resource-specific variants for
    /// `NotFound` and `AlreadyExists`.
    pub fn from_dispatch(
        err: DispatchError,
        on_missing: impl FnOnce() -> ServiceError,
        on_duplicate: impl FnOnce() -> ServiceError,
    ) -> Self {
        match err {
            DispatchError::Domain(DomainError::NotFound) => on_missing(),
            DispatchError::Domain(DomainError::AlreadyExists(_)) => on_duplicate(),
            DispatchError::Domain(other) => other.into(),
            DispatchError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvalidQuantity(msg) => ServiceError::InvalidQuantity(msg),
            DomainError::InsufficientStock { available, requested } => {
                ServiceError::InsufficientStock { available, requested }
            }
            DomainError::AlreadyResolved => ServiceError::AlreadyResolved,
            DomainError::InvalidStateTransition(msg) => ServiceError::InvalidStateTransition(msg),
            DomainError::Conflict(msg) | DomainError::AlreadyExists(msg) => ServiceError::Conflict(msg),
            DomainError::NotFound => ServiceError::Internal("unmapped not found".to_string()),
            DomainError::InvariantViolation(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(_: AuthzError) -> Self {
        ServiceError::PermissionDenied
    }
}

impl From<UnknownCapability> for ServiceError {
    fn from(err: UnknownCapability) -> Self {
        ServiceError::UnknownCapability(err.0)
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(msg) = &self {
            error!(error = %msg, "internal error");
        }
        json_error(self.status(), self.code(), self.to_string())
    }
}

fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// One missing or invalid field in a submission.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            message: "is required",
        }
    }
}

/// Error taxonomy for the publication API.
///
/// A fraud-flagged submission is deliberately NOT represented here: it is a
/// successful submission that lands in a draft state with a message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid fields")]
    Validation(Vec<FieldError>),
    /// The caller tried to pay and the debit failed. Distinct from validation
    /// so the client can route to the credit purchase flow.
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("account not found")]
    AccountNotFound,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "VALIDATION",
                    "message": "missing or invalid fields",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::InsufficientCredits => (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({
                    "error": "REQUIRES_CREDIT",
                    "message": "You need 1 credit to publish this listing.",
                    "redirect_to": "/credits",
                })),
            )
                .into_response(),
            ApiError::AccountNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "ACCOUNT_NOT_FOUND", "message": "Account not found" })),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "UNAUTHORIZED", "message": msg })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "INTERNAL", "message": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

//! API error type.
//!
//! Every handler returns `Result<_, ApiError>`. The variant picks the status
//! code; the message is what the client sees. Internal failures are logged
//! in full and answered with the handler's generic message only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use xaro_ledger::{FieldError, ValidationErrors};

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// Failures a handler can report.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body. 400 with itemized field errors.
    #[error("{message}")]
    Validation {
        message: String,
        errors: ValidationErrors,
    },

    /// Unknown id, or an operation that no longer applies. 404.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. 500. `public` goes to the client, `cause` to the log.
    #[error("{public}: {cause}")]
    Internal { public: String, cause: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(public: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            public: public.into(),
            cause: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation { message, errors } => ErrorResponse {
                error: message,
                details: errors.errors().to_vec(),
            },
            Self::NotFound(message) => ErrorResponse {
                error: message,
                details: Vec::new(),
            },
            Self::Internal { public, cause } => {
                tracing::error!(%cause, "{}", public);
                ErrorResponse {
                    error: public,
                    details: Vec::new(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(
            ApiError::validation("bad", ValidationErrors::single("x", "y")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::internal("Failed", "disk on fire").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_omits_empty_details() {
        let body = ErrorResponse {
            error: "Transaction not found".into(),
            details: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;
use crate::services::payment::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("booking reference already exists: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot move booking from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("{message}")]
    Gateway { status: u16, message: String },

    #[error("payment gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("booking storage is not configured")]
    StorageUnavailable,

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>, fields: Vec<&'static str>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Gateway { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() => code,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::GatewayUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { status, message } => AppError::Gateway { status, message },
            GatewayError::Unreachable(msg) => AppError::GatewayUnreachable(msg),
            GatewayError::UnexpectedResponse(msg) => AppError::Gateway {
                status: 502,
                message: format!("unexpected response from payment provider: {msg}"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Config(_) => tracing::error!(error = %self, "misconfigured deployment"),
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed")
            }
            _ => {}
        }

        let body = match &self {
            AppError::Validation { message, fields } => {
                serde_json::json!({ "error": message, "fields": fields })
            }
            // Internal detail stays in the logs.
            AppError::Database(_) | AppError::Internal(_) => {
                serde_json::json!({ "error": "internal server error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

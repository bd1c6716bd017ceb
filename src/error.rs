//! Error types for the book catalog server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Stable error codes exposed in the `errorCode` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    AuthorNotFound,
    BookNotFound,
    UserNotFound,
    Conflict,
    ValidationError,
    BadRequest,
    Unauthorized,
    Forbidden,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthorNotFound => "AUTHOR_NOT_FOUND",
            ErrorCode::BookNotFound => "BOOK_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    AuthorNotFound(String),

    #[error("{0}")]
    BookNotFound(String),

    #[error("{0}")]
    UserNotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::AuthorNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::AuthorNotFound),
            AppError::BookNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::BookNotFound),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::UserNotFound),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
            ),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

/// One entry per rejected request field
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorResponse {
    pub field: String,
    pub message: String,
    pub error_code: String,
    pub timestamp: DateTime<Utc>,
}

/// Validator keys are Rust field names; request bodies use camelCase
fn json_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

/// Flatten validator output into one entry per field, ordered by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldErrorResponse> {
    let timestamp = Utc::now();
    let mut fields: Vec<FieldErrorResponse> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect::<Vec<_>>()
                .join("; ");
            FieldErrorResponse {
                field: json_field_name(field),
                message,
                error_code: ErrorCode::ValidationError.as_str().to_string(),
                timestamp,
            }
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Validation(errors) => {
                tracing::warn!("Validation failed: {}", errors);
                return (status, Json(field_errors(errors))).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::AuthorNotFound(msg)
            | AppError::BookNotFound(msg)
            | AppError::UserNotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::Authentication(msg)
            | AppError::Authorization(msg) => {
                tracing::debug!("{}: {}", code.as_str(), msg);
                msg.clone()
            }
        };

        let body = Json(ErrorResponse {
            message,
            error_code: code.as_str().to_string(),
            status_code: status.as_u16(),
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Error types for Biblio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Stable error codes exposed in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    MissingCredentials,
    MalformedScheme,
    InvalidToken,
    ExpiredToken,
    InvalidCredentials,
    Forbidden,
    NotFound,
    DuplicateEmail,
    MaterialUnavailable,
    AlreadyReturned,
    InUse,
    Conflict,
    BadValue,
    IntegrityConflict,
    ConfigurationError,
    InternalError,
}

/// Failures of credential checks and bearer-token resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication scheme")]
    MalformedScheme,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signing secret or algorithm is unset or unusable
    #[error("Server configuration error: {0}")]
    Misconfigured(String),
}

impl AuthError {
    fn code(&self) -> ErrorCode {
        match self {
            AuthError::MissingCredentials => ErrorCode::MissingCredentials,
            AuthError::MalformedScheme => ErrorCode::MalformedScheme,
            AuthError::InvalidToken(_) => ErrorCode::InvalidToken,
            AuthError::ExpiredToken => ErrorCode::ExpiredToken,
            AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AuthError::Misconfigured(_) => ErrorCode::ConfigurationError,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(AuthError),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Material {0} is already on loan")]
    MaterialUnavailable(Uuid),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(Uuid),

    #[error("Cannot delete {entity}: referenced by {dependents} {dependent_kind}")]
    InUse {
        entity: &'static str,
        dependent_kind: &'static str,
        dependents: i64,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Integrity conflict: {0}")]
    IntegrityConflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(e) => (StatusCode::UNAUTHORIZED, e.code()),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::DuplicateEmail(_) => (StatusCode::BAD_REQUEST, ErrorCode::DuplicateEmail),
            AppError::MaterialUnavailable(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::MaterialUnavailable)
            }
            AppError::AlreadyReturned(_) => (StatusCode::BAD_REQUEST, ErrorCode::AlreadyReturned),
            AppError::InUse { .. } => (StatusCode::BAD_REQUEST, ErrorCode::InUse),
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, ErrorCode::Conflict),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::IntegrityConflict(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::IntegrityConflict)
            }
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ConfigurationError)
            }
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Misconfigured(msg) => AppError::Configuration(msg),
            other => AppError::Authentication(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        if let Some(db_err) = e.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    tracing::warn!(
                        constraint = db_err.constraint().unwrap_or("unknown"),
                        "Constraint violation: {}",
                        db_err.message()
                    );
                    return AppError::IntegrityConflict(
                        "Database integrity conflict".to_string(),
                    );
                }
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Stable error code name
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Authentication(e) => e.to_string(),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                self.to_string()
            }
            AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg)
            | AppError::IntegrityConflict(msg) => msg.clone(),
            AppError::DuplicateEmail(_)
            | AppError::MaterialUnavailable(_)
            | AppError::AlreadyReturned(_)
            | AppError::InUse { .. } => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: format!("{:?}", code),
            message,
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

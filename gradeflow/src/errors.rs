use crate::api::models::users::Role;
use crate::db::errors::DbError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Why a request could not be authenticated.
///
/// Every variant maps to a 401; the display text is what the client sees.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("You are not logged in! Please log in to get access.")]
    NoToken,
    #[error("Your session has expired. Please log in again.")]
    Expired,
    #[error("Invalid token. Please log in again.")]
    Malformed,
    #[error("Invalid token signature. Please log in again.")]
    Unsigned,
    #[error("Your session has been revoked. Please log in again.")]
    Revoked,
    #[error("The user belonging to this token no longer exists.")]
    UnknownIdentity,
    #[error("Invalid email or password")]
    BadCredentials,
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but missing, invalid, or revoked
    #[error("Not authenticated: {reason}")]
    Unauthenticated { reason: AuthRejection },

    /// Authenticated user does not hold the role the route requires
    #[error("Role {required} required")]
    InsufficientRole { required: Role },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conditional update matched no row. Missing, not owned, and wrong state are
    /// deliberately indistinguishable.
    #[error("{resource} with ID {id} not found or {condition}")]
    StateConflict {
        resource: String,
        id: String,
        condition: &'static str,
    },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Full error chain of a 500 response, attached as a response extension.
///
/// Only surfaced to clients by the error detail middleware in development.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } | Error::StateConflict { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { reason } => reason.to_string(),
            Error::InsufficientRole { .. } => "You do not have permission to perform this action".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::StateConflict { resource, condition, .. } => format!("{resource} not found or {condition}"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "User already exists with this email".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { constraint, .. } => match constraint.as_deref() {
                    Some("assignments_content_length") => "Content must be at least 5 characters".to_string(),
                    _ => "Invalid data provided".to_string(),
                },
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientRole { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::StateConflict { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "message": self.user_message() });
        let mut response = (status, Json(body)).into_response();

        if self.is_internal() {
            response.extensions_mut().insert(ErrorDetail(format!("{self:#}")));
        }

        response
    }
}

impl From<AuthRejection> for Error {
    fn from(reason: AuthRejection) -> Self {
        Error::Unauthenticated { reason }
    }
}

/// Unreadable bodies, unknown enum values and malformed ids are client errors
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

use crate::{
    db::errors::DbError,
    types::{Operation, Permission},
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum Error {
    /// Missing, malformed or expired bearer token, or a token for an unknown user
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Insufficient permissions: {action} on {resource} requires {required}")]
    InsufficientPermissions {
        required: Permission,
        action: Operation,
        resource: String,
    },

    #[error("{resource} not found")]
    NotFound { resource: String, id: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Internal error while trying to {operation}")]
    Internal { operation: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Database(db) => match db {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::CheckViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Server-side failures are not described in detail.
    pub fn user_message(&self) -> String {
        match self {
            Error::InsufficientPermissions { .. } => "Admin access required".to_string(),
            Error::Database(DbError::NotFound) => "Resource not found".to_string(),
            Error::Database(DbError::UniqueViolation { .. }) => "Resource already exists".to_string(),
            Error::Database(DbError::CheckViolation { .. }) => "Request violates a data constraint".to_string(),
            Error::Database(DbError::ForeignKeyViolation { .. }) => "Referenced resource does not exist".to_string(),
            Error::Database(DbError::Other(_)) | Error::Internal { .. } => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else if status == StatusCode::FORBIDDEN {
            warn!("{}", self);
        }

        (status, Json(json!({ "detail": self.user_message() }))).into_response()
    }
}

//! Error types for the tracker service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, is_transient_sqlx};
use serde_json::json;
use thiserror::Error;

/// Domain errors raised by the credential store, the ticket tables and the
/// score ledger
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("User already exists")]
    DuplicateUser,

    #[error("Ticket {0} already exists")]
    DuplicateId(i64),

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool exhausted, connection lost or timeout
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }
}

impl From<sqlx::Error> for TrackerError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient_sqlx(&err) {
            TrackerError::StorageUnavailable(err.to_string())
        } else {
            TrackerError::Storage(err.to_string())
        }
    }
}

impl From<DatabaseError> for TrackerError {
    fn from(err: DatabaseError) -> Self {
        if err.is_transient() {
            TrackerError::StorageUnavailable(err.to_string())
        } else {
            TrackerError::Storage(err.to_string())
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            TrackerError::DuplicateId(_) | TrackerError::DuplicateUser => {
                (StatusCode::CONFLICT, self.to_string())
            }
            TrackerError::UserNotFound | TrackerError::WrongPassword => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            TrackerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            TrackerError::StorageUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage unavailable".to_string(),
            ),
            TrackerError::Storage(_) | TrackerError::Hashing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for tracker results
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_storage_unavailable() {
        let err = TrackerError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, TrackerError::StorageUnavailable(_)));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (TrackerError::DuplicateId(7), StatusCode::CONFLICT),
            (TrackerError::validation("name is required"), StatusCode::BAD_REQUEST),
            (
                TrackerError::StorageUnavailable("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                TrackerError::Storage("syntax".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}

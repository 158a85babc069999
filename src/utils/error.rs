use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("no more tickets left to reserve")]
    SoldOut,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid QR token: {0}")]
    InvalidToken(String),

    #[error("ticket was re-personalized, QR code is no longer valid")]
    StaleToken { current_owner: Value },

    #[error("ticket already scanned")]
    AlreadyScanned { scanned_at: DateTime<Utc> },

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::SoldOut => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::StaleToken { .. }
            | AppError::AlreadyScanned { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::SoldOut => "SOLD_OUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::StaleToken { .. } => "STALE_TOKEN",
            AppError::AlreadyScanned { .. } => "ALREADY_SCANNED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// True when the underlying database error is a unique constraint
    /// violation (Postgres error code 23505). The completion, payment and
    /// ticket-scan inserts rely on this to detect duplicates.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::ExternalServiceError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            // Expected business outcomes (sold out, stale token, duplicate
            // scan) are part of normal operation.
            other => {
                tracing::debug!(error = ?other, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client. The scan-specific
        // variants additionally carry structured details so the door UI can
        // render the right outcome.
        let (public_message, details) = match &self {
            AppError::StaleToken { current_owner } => {
                (self.to_string(), Some(current_owner.clone()))
            }
            AppError::AlreadyScanned { scanned_at } => {
                (self.to_string(), Some(json!({ "scanned_at": scanned_at })))
            }
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
            other => (other.to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sold_out_maps_to_forbidden() {
        assert_eq!(AppError::SoldOut.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::SoldOut.code(), "SOLD_OUT");
    }

    #[test]
    fn test_scan_errors_map_to_conflict() {
        let already = AppError::AlreadyScanned {
            scanned_at: Utc::now(),
        };
        assert_eq!(already.status_code(), StatusCode::CONFLICT);

        let stale = AppError::StaleToken {
            current_owner: json!({}),
        };
        assert_eq!(stale.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_token_is_bad_request() {
        let err = AppError::InvalidToken("bad prefix".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!AppError::is_unique_violation(&sqlx::Error::RowNotFound));
    }
}

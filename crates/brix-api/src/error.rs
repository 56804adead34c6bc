//! HTTP error response conversion
//!
//! **Handler pattern:** return `Result<impl IntoResponse, HttpAppError>` and
//! use `AppError` (or types convertible into it) for failures, so every
//! error renders with a consistent status, JSON body, and log line.

use crate::auth::secure_link::SecureLinkError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use brix_core::{AppError, ErrorMetadata, LogLevel};
use brix_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse. Necessary because of
/// Rust's orphan rules - we can't implement IntoResponse (external trait)
/// for AppError (external type from brix-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::SignFailed(msg) => AppError::Storage(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            StorageError::InvalidUrl(msg) => AppError::InvalidInput(msg),
            StorageError::ImageProcessing(msg) => AppError::ImageProcessing(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
        };
        HttpAppError(app)
    }
}

/// Capability-token failures: signature/expiry problems are 401 with one
/// shared client message (expired vs. invalid is a log-only distinction);
/// binding mismatches are 403.
impl From<SecureLinkError> for HttpAppError {
    fn from(err: SecureLinkError) -> Self {
        let app = match err {
            SecureLinkError::Expired | SecureLinkError::Invalid(_) => {
                AppError::Unauthorized("Invalid or expired access token".to_string())
            }
            SecureLinkError::DocumentMismatch | SecureLinkError::PurposeMismatch => {
                AppError::Forbidden("Access token does not grant access to this document".to_string())
            }
            SecureLinkError::Issue(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Hide details in production; outside production only show them for
        // non-sensitive errors.
        let body = if is_production || app_error.is_sensitive() {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: None,
                error_type: None,
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
            })
        } else {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
            })
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_upload_failed() {
        let HttpAppError(app) = StorageError::UploadFailed("boom".to_string()).into();
        assert!(matches!(app, AppError::Storage(msg) if msg == "boom"));
    }

    #[test]
    fn test_from_storage_error_invalid_url() {
        let HttpAppError(app) = StorageError::InvalidUrl("bad".to_string()).into();
        assert!(matches!(app, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_secure_link_errors_share_client_message() {
        let HttpAppError(expired) = SecureLinkError::Expired.into();
        let HttpAppError(invalid) = SecureLinkError::Invalid("bad signature".to_string()).into();
        // the response body must not reveal whether a token was expired or forged
        assert_eq!(expired.client_message(), invalid.client_message());
        assert_eq!(expired.http_status_code(), 401);
        assert_eq!(invalid.http_status_code(), 401);
    }

    #[test]
    fn test_secure_link_mismatch_is_forbidden() {
        let HttpAppError(app) = SecureLinkError::DocumentMismatch.into();
        assert_eq!(app.http_status_code(), 403);
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Not found".to_string(),
            details: None,
            error_type: None,
            code: "NOT_FOUND".to_string(),
            recoverable: false,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("error").and_then(|v| v.as_str()).is_some());
        assert_eq!(json.get("code").and_then(|v| v.as_str()), Some("NOT_FOUND"));
        assert!(json.get("details").is_none());
    }
}

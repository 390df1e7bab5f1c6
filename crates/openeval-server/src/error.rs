//! API error types with JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use openeval_core::{ApiKeyError, VaultError};
use openeval_integrations::clio::upload::UploadError;
use openeval_integrations::{ClioError, ResendError, StripeError};
use openeval_store::StoreError;
use serde::Serialize;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unauthorized (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// An optional provider is not configured on this deployment (500).
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Store error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Clio call failed. The provider's message is passed through.
    #[error("{0}")]
    Clio(#[from] ClioError),

    #[error("{0}")]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Stripe(#[from] StripeError),

    #[error("{0}")]
    Email(#[from] ResendError),

    /// Stored token could not be unsealed.
    #[error("token vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("{0}")]
    ApiKey(#[from] ApiKeyError),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
            Self::Store(_) => "STORAGE_ERROR",
            Self::Clio(ClioError::InvalidNonce) => "INVALID_NONCE",
            Self::Clio(_) => "CLIO_ERROR",
            Self::Upload(UploadError::MissingMatter) => "MISSING_MATTER",
            Self::Upload(_) => "CLIO_UPLOAD_FAILED",
            Self::Stripe(_) => "PAYMENT_ERROR",
            Self::Email(_) => "EMAIL_ERROR",
            Self::Vault(_) => "VAULT_ERROR",
            Self::ApiKey(ApiKeyError::Malformed) => "UNAUTHORIZED",
            Self::ApiKey(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) | Self::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => match e {
                StoreError::ClioQuoteNotFound(_) => StatusCode::NOT_FOUND,
                StoreError::QuoteNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Clio(e) => match e {
                ClioError::InvalidNonce => StatusCode::FORBIDDEN,
                ClioError::InvalidSubjectUrl(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Upload(UploadError::MissingMatter) => StatusCode::BAD_REQUEST,
            Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Stripe(_) | Self::Email(_) | Self::Vault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ApiKey(ApiKeyError::Malformed) => StatusCode::UNAUTHORIZED,
            Self::ApiKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "MISSING_MATTER").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_missing_matter_is_bad_request() {
        let err = ApiError::from(UploadError::MissingMatter);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "MISSING_MATTER");
        assert!(err.to_string().starts_with("No Clio Matter ID"));
    }

    #[test]
    fn test_clio_errors() {
        assert_eq!(
            ApiError::from(ClioError::InvalidNonce).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(ClioError::InvalidSubjectUrl("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );

        let upstream = ApiError::from(ClioError::Api {
            status: 502,
            message: "Bad Gateway".into(),
        });
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(upstream.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_store_not_found() {
        let err = ApiError::from(StoreError::ClioQuoteNotFound(Uuid::nil()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_malformed_api_key_is_unauthorized() {
        let err = ApiError::from(ApiKeyError::Malformed);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_configured() {
        let err = ApiError::NotConfigured("Stripe");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Stripe is not configured");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("matter_id must be positive".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(
            json["error"]["message"],
            "bad request: matter_id must be positive"
        );
    }
}

//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{listing::ListingError, signer::SigningError, upload::UploadError};

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert signing errors to application errors
impl From<SigningError> for AppError {
    fn from(err: SigningError) -> Self {
        match &err {
            SigningError::InvalidRequest(msg) => {
                tracing::warn!("Invalid sign request: {msg}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    "Invalid presign request",
                    false,
                )
            }
            SigningError::CredentialUnavailable(msg) => {
                tracing::error!("Credentials unavailable: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "credentials_unavailable",
                    "Signing credentials temporarily unavailable",
                    true,
                )
            }
            SigningError::SigningFailure(msg) => {
                tracing::error!("Signing failure: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "signing_failure",
                    "Failed to sign URL",
                    false,
                )
            }
        }
    }
}

/// Convert upload precondition errors to application errors
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        tracing::warn!("{err}");
        match err {
            UploadError::ContentTypeMismatch { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "content_type_mismatch",
                "Content type does not match the signed content type",
                false,
            ),
        }
    }
}

/// Convert listing errors to application errors
impl From<ListingError> for AppError {
    #[allow(clippy::cognitive_complexity)]
    fn from(err: ListingError) -> Self {
        match &err {
            ListingError::BucketNotFound(bucket) => {
                tracing::debug!("Bucket not found: {bucket}");
                Self::new(
                    StatusCode::NOT_FOUND,
                    "bucket_not_found",
                    "Bucket does not exist",
                    false,
                )
            }
            ListingError::UpstreamError(msg) => {
                tracing::error!("S3 upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "S3 service temporarily unavailable",
                    true,
                )
            }
            ListingError::S3Error(msg) => {
                tracing::error!("S3 error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            ListingError::InvalidInput(msg) => {
                tracing::warn!("Invalid input: {msg}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_input",
                    "Invalid input provided",
                    false,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}

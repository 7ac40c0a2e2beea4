//! Error types for URL signing

use aws_sdk_s3::{
    error::SdkError,
    operation::{get_object::GetObjectError, put_object::PutObjectError},
    presigning::PresigningConfigError,
};
use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Errors that can occur while issuing a presigned URL
#[derive(Error, Debug)]
pub enum SigningError {
    /// Bucket, key, method, content type or validity is not acceptable
    #[error("Invalid sign request: {0}")]
    InvalidRequest(String),

    /// The credentials provider is missing or failed to resolve credentials
    #[error("Credentials unavailable: {0}")]
    CredentialUnavailable(String),

    /// The SDK failed to produce a signature
    #[error("Signing failure: {0}")]
    SigningFailure(String),
}

impl From<PresigningConfigError> for SigningError {
    fn from(error: PresigningConfigError) -> Self {
        Self::SigningFailure(format!("Failed to create presigning config: {error}"))
    }
}

impl From<SdkError<PutObjectError>> for SigningError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        Self::SigningFailure(format!("Failed to presign PutObject: {error}"))
    }
}

impl From<SdkError<GetObjectError>> for SigningError {
    fn from(error: SdkError<GetObjectError>) -> Self {
        Self::SigningFailure(format!("Failed to presign GetObject: {error}"))
    }
}

//! Error types for bucket listing

use aws_sdk_s3::{
    error::SdkError,
    operation::{head_bucket::HeadBucketError, list_objects_v2::ListObjectsV2Error},
};
use thiserror::Error;

/// Result type for listing operations
pub type ListingResult<T> = Result<T, ListingError>;

/// Errors that can occur while listing a bucket
#[derive(Error, Debug)]
pub enum ListingError {
    /// The bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<SdkError<HeadBucketError>> for ListingError {
    fn from(error: SdkError<HeadBucketError>) -> Self {
        Self::S3Error(error.to_string())
    }
}

impl From<SdkError<ListObjectsV2Error>> for ListingError {
    fn from(error: SdkError<ListObjectsV2Error>) -> Self {
        match error {
            SdkError::ServiceError(err) if err.raw().status().as_u16() >= 500 => {
                Self::UpstreamError(format!("{:?}", err.err()))
            }
            SdkError::ServiceError(err) => Self::S3Error(format!("{:?}", err.err())),
            _ => Self::S3Error(error.to_string()),
        }
    }
}

//! Bucket listing through the S3 API
mod error;

use std::sync::Arc;

use aws_sdk_s3::{
    error::SdkError,
    operation::{head_bucket::HeadBucketError, list_objects_v2::ListObjectsV2Error},
    primitives::DateTimeFormat,
    types::Object,
    Client as S3Client,
};
use tracing::{debug, error};

pub use error::{ListingError, ListingResult};

/// Largest page `ListObjectsV2` returns
pub const MAX_KEYS_PER_PAGE: i32 = 1000;

/// One object of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: Option<i64>,
    /// RFC 3339 timestamp of the last modification
    pub last_modified: Option<String>,
    /// Entity tag as returned by the store
    pub e_tag: Option<String>,
}

impl From<&Object> for ObjectSummary {
    fn from(object: &Object) -> Self {
        Self {
            key: object.key().unwrap_or_default().to_string(),
            size: object.size(),
            last_modified: object
                .last_modified()
                .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
            e_tag: object.e_tag().map(ToString::to_string),
        }
    }
}

/// A single page of objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectListing {
    /// Bucket that was listed
    pub bucket: String,
    /// Objects in this page, possibly empty
    pub objects: Vec<ObjectSummary>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Token to pass back to fetch the next page
    pub next_continuation_token: Option<String>,
}

/// Lists objects of S3 buckets
pub struct BucketListing {
    s3_client: Arc<S3Client>,
}

impl BucketListing {
    /// Creates a new listing client
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>) -> Self {
        Self { s3_client }
    }

    /// Checks if a bucket exists
    ///
    /// # Errors
    ///
    /// Returns `ListingError::UpstreamError` for 5xx errors
    /// Returns `ListingError::S3Error` for other S3 service errors
    pub async fn exists(&self, bucket: &str) -> ListingResult<bool> {
        let result = self.s3_client.head_bucket().bucket(bucket).send().await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_))
                    || service_err.raw().status().as_u16() == 404 =>
            {
                debug!("Bucket does not exist: {bucket}");
                Ok(false)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                error!("Upstream error checking bucket {bucket}");
                Err(ListingError::UpstreamError(format!("{:?}", service_err.err())))
            }
            Err(e) => Err(ListingError::from(e)),
        }
    }

    /// Lists one page of objects
    ///
    /// # Arguments
    ///
    /// * `bucket` - Bucket to list
    /// * `continuation_token` - Token from a previous page, `None` for the first page
    /// * `max_keys` - Page size, clamped to `1..=1000`
    ///
    /// # Errors
    ///
    /// Returns `ListingError::InvalidInput` if the bucket name is blank
    /// Returns `ListingError::BucketNotFound` if the bucket does not exist
    /// Returns `ListingError::UpstreamError` for 5xx errors
    pub async fn list(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> ListingResult<ObjectListing> {
        if bucket.trim().is_empty() {
            return Err(ListingError::InvalidInput(
                "bucket must not be empty".to_string(),
            ));
        }

        let max_keys = max_keys
            .unwrap_or(MAX_KEYS_PER_PAGE)
            .clamp(1, MAX_KEYS_PER_PAGE);

        let result = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .max_keys(max_keys)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), ListObjectsV2Error::NoSuchBucket(_)) =>
            {
                return Err(ListingError::BucketNotFound(bucket.to_string()));
            }
            Err(e) => {
                error!("Failed to list bucket {bucket}: {e}");
                return Err(ListingError::from(e));
            }
        };

        let objects: Vec<ObjectSummary> = output.contents().iter().map(Into::into).collect();

        debug!("Listed {} objects from {bucket}", objects.len());

        Ok(ObjectListing {
            bucket: bucket.to_string(),
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(ToString::to_string),
        })
    }
}

//! `GET /s3ListObjects`

use std::sync::Arc;

use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    listing::{BucketListing, ObjectListing, ObjectSummary},
    types::{AppError, Environment, ValidatedQuery},
};

/// Query of `GET /s3ListObjects`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsQuery {
    /// Bucket name, defaults to the configured bucket
    #[validate(length(min = 1, max = 63))]
    pub bucket_name: Option<String>,
    /// Token returned by the previous page
    pub continuation_token: Option<String>,
    /// Page size, between 1 and 1000
    #[validate(range(min = 1, max = 1000))]
    pub max_keys: Option<i32>,
}

/// One listed object
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ObjectSummaryResponse {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: Option<i64>,
    /// RFC 3339 timestamp of the last modification
    pub last_modified: Option<String>,
    /// Entity tag
    pub e_tag: Option<String>,
}

/// A page of listed objects
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListObjectsResponse {
    /// Bucket that was listed
    pub bucket: String,
    /// Objects in this page
    pub objects: Vec<ObjectSummaryResponse>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Pass back as `continuationToken` to get the next page
    pub next_continuation_token: Option<String>,
}

impl From<ObjectSummary> for ObjectSummaryResponse {
    fn from(object: ObjectSummary) -> Self {
        Self {
            key: object.key,
            size: object.size,
            last_modified: object.last_modified,
            e_tag: object.e_tag,
        }
    }
}

impl From<ObjectListing> for ListObjectsResponse {
    fn from(listing: ObjectListing) -> Self {
        Self {
            bucket: listing.bucket,
            objects: listing.objects.into_iter().map(Into::into).collect(),
            is_truncated: listing.is_truncated,
            next_continuation_token: listing.next_continuation_token,
        }
    }
}

/// Lists one page of objects in a bucket
///
/// # Errors
///
/// - `bucket_not_found` - The bucket does not exist
/// - `upstream_error` - 5xx errors from the S3 service
/// - `internal_error` - Other S3 service errors
#[instrument(skip(environment, listing))]
pub async fn list_objects(
    Extension(environment): Extension<Environment>,
    Extension(listing): Extension<Arc<BucketListing>>,
    ValidatedQuery(query): ValidatedQuery<ListObjectsQuery>,
) -> Result<Json<ListObjectsResponse>, AppError> {
    let bucket = query
        .bucket_name
        .unwrap_or_else(|| environment.s3_bucket());

    let page = listing
        .list(&bucket, query.continuation_token, query.max_keys)
        .await?;

    Ok(Json(page.into()))
}

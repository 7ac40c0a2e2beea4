//! `POST /uploads`

use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    listing::{BucketListing, ListingError},
    routes::presign::requested_validity,
    signer::{SignRequest, UrlSigner},
    types::{AppError, Environment, ValidatedQuery},
    upload::UploadExecutor,
};

/// Query of `POST /uploads`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct RelayUploadQuery {
    /// Bucket name, defaults to the configured bucket
    #[validate(length(min = 1, max = 63))]
    pub bucket: Option<String>,
    /// Object key
    #[validate(length(min = 1, max = 1024))]
    pub key: String,
    /// Validity of the intermediate URL in seconds
    pub expires_in_secs: Option<i64>,
}

/// Outcome of a relayed upload
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RelayUploadResponse {
    /// Bucket the object was written to
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Status returned by the store
    pub status_code: u16,
}

/// Uploads the request body through a freshly presigned PUT URL
///
/// The URL is bound to the request's `Content-Type`, then used once.
///
/// # Errors
///
/// - `missing_content_type` - No usable `Content-Type` header
/// - `bucket_not_found` - The bucket does not exist
/// - `invalid_request` - Blank key, invalid content type or validity outside the allowed window
/// - `upload_failed` - The store could not be reached or rejected the upload
#[instrument(skip(environment, signer, listing, uploader, headers, body))]
pub async fn relay_upload(
    Extension(environment): Extension<Environment>,
    Extension(signer): Extension<Arc<dyn UrlSigner>>,
    Extension(listing): Extension<Arc<BucketListing>>,
    Extension(uploader): Extension<Arc<UploadExecutor>>,
    ValidatedQuery(query): ValidatedQuery<RelayUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RelayUploadResponse>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "missing_content_type",
                "Missing Content-Type header",
                false,
            )
        })?;

    let bucket = query.bucket.unwrap_or_else(|| environment.s3_bucket());
    if !listing.exists(&bucket).await? {
        return Err(ListingError::BucketNotFound(bucket).into());
    }

    let validity = requested_validity(&environment, query.expires_in_secs);
    let signed = signer
        .sign(SignRequest::put(&bucket, &query.key, validity).with_content_type(&content_type))
        .await?;

    let result = uploader.upload(&signed, body, &content_type).await?;

    match result.status_code {
        Some(status_code) if result.succeeded => Ok(Json(RelayUploadResponse {
            bucket,
            key: query.key,
            status_code,
        })),
        _ => {
            tracing::warn!(
                status = ?result.status_code,
                detail = ?result.error_detail,
                "Relayed upload failed"
            );
            Err(AppError::new(
                StatusCode::BAD_GATEWAY,
                "upload_failed",
                "Object store did not accept the upload",
                true,
            ))
        }
    }
}

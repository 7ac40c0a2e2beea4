//! `GET /getPresignedUrl` and `GET /getPresignedUploadUrl`

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{Extension, Json};
use chrono::TimeDelta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    signer::{SignRequest, SignedUrl, UrlSigner},
    types::{AppError, Environment, ValidatedQuery},
};

/// Content type bound to upload URLs when the caller does not pick one
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "text/plain";

/// Query of `GET /getPresignedUrl`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct PresignDownloadQuery {
    /// Bucket name, defaults to the configured bucket
    #[validate(length(min = 1, max = 63))]
    pub bucket: Option<String>,
    /// Object key
    #[validate(length(min = 1, max = 1024))]
    pub key: String,
    /// Validity in seconds, defaults to the configured validity
    pub expires_in_secs: Option<i64>,
}

/// Query of `GET /getPresignedUploadUrl`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct PresignUploadQuery {
    /// Bucket name, defaults to the configured bucket
    #[validate(length(min = 1, max = 63))]
    pub bucket: Option<String>,
    /// Object key
    #[validate(length(min = 1, max = 1024))]
    pub key: String,
    /// Content type the uploader must send, defaults to `text/plain`
    #[validate(length(min = 1, max = 255))]
    pub content_type: Option<String>,
    /// Validity in seconds, defaults to the configured validity
    pub expires_in_secs: Option<i64>,
}

/// A presigned URL as returned to clients
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PresignedUrlResponse {
    /// Presigned URL, opaque to the caller
    pub presigned_url: String,
    /// HTTP method the URL is signed for
    pub method: String,
    /// Headers that must accompany the request
    pub headers: BTreeMap<String, String>,
    /// Content type the upload must declare, if bound
    pub content_type: Option<String>,
    /// ISO-8601 UTC timestamp when the presigned URL expires
    pub expires_at: String,
}

impl From<SignedUrl> for PresignedUrlResponse {
    fn from(signed: SignedUrl) -> Self {
        Self {
            presigned_url: signed.url().to_string(),
            method: signed.method().to_string(),
            headers: signed.headers().clone(),
            content_type: signed.bound_content_type().map(ToString::to_string),
            expires_at: signed.expires_at().to_rfc3339(),
        }
    }
}

/// Resolves the requested validity, out-of-range values are left for the signer to reject
#[must_use]
pub fn requested_validity(environment: &Environment, expires_in_secs: Option<i64>) -> TimeDelta {
    expires_in_secs.map_or_else(
        || environment.default_presign_validity(),
        |secs| TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX),
    )
}

/// Creates a presigned URL for downloading an object
///
/// # Errors
///
/// - `invalid_request` - Blank bucket/key or validity outside the allowed window
/// - `credentials_unavailable` - Signing credentials could not be resolved
/// - `signing_failure` - The SDK failed to sign the request
#[instrument(skip(environment, signer))]
pub async fn create_presigned_download_url(
    Extension(environment): Extension<Environment>,
    Extension(signer): Extension<Arc<dyn UrlSigner>>,
    ValidatedQuery(query): ValidatedQuery<PresignDownloadQuery>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let bucket = query.bucket.unwrap_or_else(|| environment.s3_bucket());
    let validity = requested_validity(&environment, query.expires_in_secs);

    let signed = signer
        .sign(SignRequest::get(bucket, query.key, validity))
        .await?;

    Ok(Json(signed.into()))
}

/// Creates a presigned URL for uploading an object with PUT
///
/// The URL is bound to the requested content type; uploads declaring any
/// other content type are refused by the store.
///
/// # Errors
///
/// - `invalid_request` - Blank bucket/key, invalid content type or validity outside the allowed window
/// - `credentials_unavailable` - Signing credentials could not be resolved
/// - `signing_failure` - The SDK failed to sign the request
#[instrument(skip(environment, signer))]
pub async fn create_presigned_upload_url(
    Extension(environment): Extension<Environment>,
    Extension(signer): Extension<Arc<dyn UrlSigner>>,
    ValidatedQuery(query): ValidatedQuery<PresignUploadQuery>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let bucket = query.bucket.unwrap_or_else(|| environment.s3_bucket());
    let validity = requested_validity(&environment, query.expires_in_secs);
    let content_type = query
        .content_type
        .unwrap_or_else(|| DEFAULT_UPLOAD_CONTENT_TYPE.to_string());

    let signed = signer
        .sign(SignRequest::put(bucket, query.key, validity).with_content_type(content_type))
        .await?;

    tracing::info!(
        method = %signed.method(),
        expires_at = %signed.expires_at(),
        "Issued presigned upload URL"
    );

    Ok(Json(signed.into()))
}

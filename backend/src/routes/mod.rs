mod docs;
mod health;
pub mod objects;
pub mod presign;
pub mod uploads;

use std::time::Duration;

use aide::axum::{routing::get, ApiRouter};
use axum::routing::post;
use tower_http::timeout::TimeoutLayer;

/// Timeout of every route except the upload relay
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Time the relay may spend on top of the upload itself
const RELAY_OVERHEAD: Duration = Duration::from_secs(10);

/// Creates the router with all handler routes
///
/// The relay route outlives `upload_timeout`, so a slow store surfaces as
/// an unsuccessful upload rather than a request timeout.
pub fn handler(upload_timeout: Duration) -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route(
            "/getPresignedUrl",
            get(presign::create_presigned_download_url),
        )
        .api_route(
            "/getPresignedUploadUrl",
            get(presign::create_presigned_upload_url),
        )
        .api_route("/s3ListObjects", get(objects::list_objects))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .route(
            "/uploads",
            post(uploads::relay_upload).layer(TimeoutLayer::new(upload_timeout + RELAY_OVERHEAD)),
        )
}

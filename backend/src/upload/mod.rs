//! Uploads through presigned URLs
mod error;

use std::time::Duration;

use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use tracing::{debug, warn};

use crate::signer::SignedUrl;

pub use error::UploadError;

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;
/// At most this many bytes of a rejection body are read
const MAX_ERROR_DETAIL_BYTES: usize = 1024;

/// Outcome of an upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// HTTP status returned by the store, `None` if no response was received
    pub status_code: Option<u16>,
    /// Whether the store answered with a 2xx status
    pub succeeded: bool,
    /// Transport error or rejection body when the upload did not succeed
    pub error_detail: Option<String>,
}

impl UploadResult {
    fn accepted(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            succeeded: true,
            error_detail: None,
        }
    }

    fn rejected(status_code: u16, body: &[u8]) -> Self {
        let body = &body[..body.len().min(MAX_ERROR_DETAIL_BYTES)];
        Self {
            status_code: Some(status_code),
            succeeded: false,
            error_detail: Some(String::from_utf8_lossy(body).into_owned()),
        }
    }

    fn transport_failure(error: &reqwest_middleware::Error) -> Self {
        Self {
            status_code: None,
            succeeded: false,
            error_detail: Some(format!("transport error: {error}")),
        }
    }

    /// True when the request never got a response
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        self.status_code.is_none()
    }
}

/// Sends payloads to presigned URLs
pub struct UploadExecutor {
    http_client: ClientWithMiddleware,
}

impl UploadExecutor {
    /// Creates a new executor whose requests give up after `timeout`
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let reqwest_client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()
            .expect("Failed to create HTTP client");

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self { http_client }
    }

    /// Sends `payload` to `signed_url` with the method it was signed for
    ///
    /// The request carries the signed headers and `Content-Type:
    /// declared_content_type`. Transport failures and non-2xx answers are
    /// returned as an unsuccessful `UploadResult`; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::ContentTypeMismatch` without sending anything when
    /// the URL is bound to a content type other than `declared_content_type`
    pub async fn upload(
        &self,
        signed_url: &SignedUrl,
        payload: impl Into<reqwest::Body> + Send,
        declared_content_type: &str,
    ) -> Result<UploadResult, UploadError> {
        check_content_type(signed_url.bound_content_type(), declared_content_type)?;

        let mut request = self
            .http_client
            .request(signed_url.method().as_http(), signed_url.url());

        for (name, value) in signed_url.headers() {
            if name != header::CONTENT_TYPE.as_str() && name != header::HOST.as_str() {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request
            .header(header::CONTENT_TYPE, declared_content_type)
            .body(payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %signed_url.method(), "Presigned upload transport failure: {e}");
                return Ok(UploadResult::transport_failure(&e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Presigned upload accepted");
            return Ok(UploadResult::accepted(status.as_u16()));
        }

        warn!(status = status.as_u16(), "Presigned upload rejected by store");

        let body = read_error_body(response).await;

        Ok(UploadResult::rejected(status.as_u16(), &body))
    }
}

/// Reads the start of a rejection body, the rest is never buffered
async fn read_error_body(mut response: reqwest::Response) -> Vec<u8> {
    let mut body = Vec::new();

    while body.len() < MAX_ERROR_DETAIL_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                debug!("Rejection body could not be read: {e}");
                break;
            }
        }
    }

    body
}

/// The signature covers the literal header value, so the comparison is exact
fn check_content_type(bound: Option<&str>, declared: &str) -> Result<(), UploadError> {
    match bound {
        Some(expected) if expected != declared => Err(UploadError::ContentTypeMismatch {
            expected: expected.to_string(),
            declared: declared.to_string(),
        }),
        _ => Ok(()),
    }
}

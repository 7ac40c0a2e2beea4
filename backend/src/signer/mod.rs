//! Presigned URL issuance
mod error;
mod s3;

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use strum::{Display, EnumString};

pub use error::{SigningError, SigningResult};
pub use s3::S3UrlSigner;

/// Longest validity SigV4 query signing accepts, in seconds (7 days)
pub const MAX_SIGNATURE_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Longest validity SigV4 query signing accepts
#[must_use]
pub fn max_signature_validity() -> TimeDelta {
    TimeDelta::seconds(MAX_SIGNATURE_VALIDITY_SECS)
}

/// HTTP methods a URL can be signed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Download an object
    Get,
    /// Upload (overwrite) an object
    Put,
}

impl HttpMethod {
    /// The method as an HTTP request method
    #[must_use]
    pub const fn as_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Put => http::Method::PUT,
        }
    }
}

/// Parameters of a single signing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Target bucket
    pub bucket: String,
    /// Target object key
    pub key: String,
    /// Method the URL will be usable with
    pub method: HttpMethod,
    /// Content type the holder must send, PUT only
    pub content_type: Option<String>,
    /// How long the URL stays valid after issuance
    pub validity: TimeDelta,
}

impl SignRequest {
    /// Request a download URL
    #[must_use]
    pub fn get(bucket: impl Into<String>, key: impl Into<String>, validity: TimeDelta) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            method: HttpMethod::Get,
            content_type: None,
            validity,
        }
    }

    /// Request an upload URL
    #[must_use]
    pub fn put(bucket: impl Into<String>, key: impl Into<String>, validity: TimeDelta) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            method: HttpMethod::Put,
            content_type: None,
            validity,
        }
    }

    /// Binds the URL to a content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Checks the request against the signer's maximum validity
    ///
    /// # Errors
    ///
    /// Returns `SigningError::InvalidRequest` when the bucket or key is blank,
    /// the validity is outside `(0, max_validity]`, the content type is not a
    /// MIME type, or a content type is bound to a GET request
    pub fn validate(&self, max_validity: TimeDelta) -> SigningResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(SigningError::InvalidRequest(
                "bucket must not be empty".to_string(),
            ));
        }

        if self.key.trim().is_empty() {
            return Err(SigningError::InvalidRequest(
                "key must not be empty".to_string(),
            ));
        }

        if self.validity <= TimeDelta::zero() {
            return Err(SigningError::InvalidRequest(format!(
                "validity must be positive, got {}s",
                self.validity.num_seconds()
            )));
        }

        let max_validity = max_validity.min(max_signature_validity());
        if self.validity > max_validity {
            return Err(SigningError::InvalidRequest(format!(
                "validity must not exceed {}s, got {}s",
                max_validity.num_seconds(),
                self.validity.num_seconds()
            )));
        }

        if let Some(content_type) = &self.content_type {
            if self.method != HttpMethod::Put {
                return Err(SigningError::InvalidRequest(
                    "content type can only be bound to PUT".to_string(),
                ));
            }
            content_type.parse::<mime::Mime>().map_err(|e| {
                SigningError::InvalidRequest(format!("invalid content type {content_type}: {e}"))
            })?;
        }

        Ok(())
    }
}

/// A presigned URL and everything needed to use it
///
/// Fields are read-only: the signature covers method, content type and
/// expiry, so none of them can change after issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    url: String,
    method: HttpMethod,
    headers: BTreeMap<String, String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    bound_content_type: Option<String>,
}

impl SignedUrl {
    /// Absolute URL carrying signature, scope and expiry as query parameters
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Method the URL was signed for
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Headers the holder must send along with the request
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// When the signature was computed
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the remote store stops accepting the URL
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Content type the signature is bound to, if any
    #[must_use]
    pub fn bound_content_type(&self) -> Option<&str> {
        self.bound_content_type.as_deref()
    }
}

/// Issues presigned URLs
#[async_trait::async_trait]
pub trait UrlSigner: Send + Sync {
    /// Signs `request`, binding bucket, key, method, content type and expiry
    async fn sign(&self, request: SignRequest) -> SigningResult<SignedUrl>;
}

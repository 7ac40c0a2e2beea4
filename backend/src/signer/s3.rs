//! S3 presigning backed by the AWS SDK

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use aws_credential_types::{
    provider::{ProvideCredentials, SharedCredentialsProvider},
    Credentials,
};
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{SubsecRound, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{HttpMethod, SignRequest, SignedUrl, SigningError, SigningResult, UrlSigner};

/// Credentials expiring within this window are resolved again
const CREDENTIALS_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Signs object URLs with the credentials of a configured S3 client
pub struct S3UrlSigner {
    s3_client: Arc<S3Client>,
    credentials_provider: Option<SharedCredentialsProvider>,
    resolved_credentials: RwLock<Option<Credentials>>,
    max_validity: TimeDelta,
}

impl S3UrlSigner {
    /// Creates a new signer
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client, signs every URL
    /// * `credentials_provider` - Provider the client was configured with, checked before signing
    /// * `max_validity` - Longest validity a caller may request (capped at 7 days)
    #[must_use]
    pub fn new(
        s3_client: Arc<S3Client>,
        credentials_provider: Option<SharedCredentialsProvider>,
        max_validity: TimeDelta,
    ) -> Self {
        Self {
            s3_client,
            credentials_provider,
            resolved_credentials: RwLock::new(None),
            max_validity,
        }
    }

    /// Resolves credentials up front so provider failures are reported apart
    /// from signing failures. Resolved credentials are reused until they are
    /// about to expire.
    async fn ensure_credentials(&self) -> SigningResult<()> {
        if self
            .resolved_credentials
            .read()
            .await
            .as_ref()
            .is_some_and(is_fresh)
        {
            return Ok(());
        }

        let provider = self.credentials_provider.as_ref().ok_or_else(|| {
            SigningError::CredentialUnavailable("no credentials provider configured".to_string())
        })?;

        let credentials = provider.provide_credentials().await.map_err(|e| {
            warn!("Credentials provider failed: {e}");
            SigningError::CredentialUnavailable(e.to_string())
        })?;

        *self.resolved_credentials.write().await = Some(credentials);

        Ok(())
    }
}

fn is_fresh(credentials: &Credentials) -> bool {
    credentials
        .expiry()
        .is_none_or(|expiry| expiry > SystemTime::now() + CREDENTIALS_REFRESH_MARGIN)
}

#[async_trait::async_trait]
impl UrlSigner for S3UrlSigner {
    async fn sign(&self, request: SignRequest) -> SigningResult<SignedUrl> {
        request.validate(self.max_validity)?;
        self.ensure_credentials().await?;

        let validity = request
            .validity
            .to_std()
            .map_err(|e| SigningError::InvalidRequest(format!("invalid validity: {e}")))?;

        // X-Amz-Date has whole-second precision
        let issued_at = Utc::now().trunc_subsecs(0);
        let presigning_config = PresigningConfig::builder()
            .start_time(SystemTime::from(issued_at))
            .expires_in(validity)
            .build()?;

        let presigned = match request.method {
            HttpMethod::Put => {
                self.s3_client
                    .put_object()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .set_content_type(request.content_type.clone())
                    .presigned(presigning_config)
                    .await?
            }
            HttpMethod::Get => {
                self.s3_client
                    .get_object()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .presigned(presigning_config)
                    .await?
            }
        };

        let url = url::Url::parse(presigned.uri())
            .map_err(|e| SigningError::SigningFailure(format!("SDK returned a relative URL: {e}")))?;

        let headers = presigned
            .headers()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();

        let expires_at = issued_at + request.validity;

        debug!(
            bucket = %request.bucket,
            key = %request.key,
            method = %request.method,
            %expires_at,
            "Issued presigned URL"
        );

        Ok(SignedUrl {
            url: url.into(),
            method: request.method,
            headers,
            issued_at,
            expires_at,
            bound_content_type: request.content_type,
        })
    }
}

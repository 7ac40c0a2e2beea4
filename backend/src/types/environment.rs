//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{
    meta::region::RegionProviderChain, retry::RetryConfig, timeout::TimeoutConfig,
    BehaviorVersion, Region,
};
use aws_sdk_s3::config::RequestChecksumCalculation;
use chrono::TimeDelta;
use tracing::Level;

use crate::signer::MAX_SIGNATURE_VALIDITY_SECS;

/// Default validity of issued URLs (10 minutes)
const DEFAULT_PRESIGN_EXPIRY_SECS: i64 = 10 * 60;
/// Default timeout of presigned uploads
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;
/// Region used when none is configured
const DEFAULT_REGION: &str = "eu-west-3";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<i64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<i64>().ok())
                    .filter(|secs| *secs > 0);

                Self::Development {
                    presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Stage name as accepted by `APP_ENV`
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development { .. } => "development",
        }
    }

    /// Returns the default S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "presign-gateway-dev".to_string())
            }
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let region = RegionProviderChain::default_provider().or_else(Region::new(DEFAULT_REGION));

        let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration derived from the shared AWS configuration
    #[must_use]
    pub fn s3_client_config(&self, aws_config: &aws_config::SdkConfig) -> aws_sdk_s3::Config {
        let s3_config: aws_sdk_s3::Config = aws_config.into();
        let mut builder = s3_config.to_builder();

        // Presigned PUTs must not carry a checksum of an empty body
        builder.set_request_checksum_calculation(Some(RequestChecksumCalculation::WhenRequired));

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Validity of issued URLs when the caller does not ask for one
    #[must_use]
    pub fn default_presign_validity(&self) -> TimeDelta {
        match self {
            Self::Production | Self::Staging => TimeDelta::seconds(DEFAULT_PRESIGN_EXPIRY_SECS),
            Self::Development {
                presign_expiry_override,
            } => TimeDelta::try_seconds(
                presign_expiry_override.unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),
            )
            .unwrap_or(TimeDelta::MAX),
        }
    }

    /// Longest validity a caller may ask for, never above 7 days
    #[must_use]
    pub fn max_presign_validity(&self) -> TimeDelta {
        let secs = env::var("PRESIGNED_URL_MAX_EXPIRY_SECS")
            .ok()
            .and_then(|val| val.parse::<i64>().ok())
            .unwrap_or(MAX_SIGNATURE_VALIDITY_SECS)
            .clamp(1, MAX_SIGNATURE_VALIDITY_SECS);

        TimeDelta::seconds(secs)
    }

    /// Timeout of a single presigned upload
    #[must_use]
    pub fn upload_timeout(&self) -> Duration {
        let secs = env::var("UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS);

        Duration::from_secs(secs)
    }

    /// Default tracing level, `TRACING_LEVEL` takes precedence
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}

use std::sync::Arc;
use std::time::Duration;

use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_s3::config::{
    retry::RetryConfig, BehaviorVersion, Credentials, Region, RequestChecksumCalculation,
};
use aws_sdk_s3::Client as S3Client;
use axum::{body::Body, http::Method, http::Request, response::Response, Extension, Router};
use chrono::TimeDelta;
use presign_gateway::{
    listing::BucketListing,
    routes,
    signer::{S3UrlSigner, UrlSigner},
    types::Environment,
    upload::UploadExecutor,
};
use tower::ServiceExt;

use super::FakeStore;

pub const TEST_BUCKET: &str = "b1";

/// Upload timeout of the executor used by `TestContext`
pub const TEST_UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Setup test environment variables and logging
pub fn setup_test_env() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Static credentials every test client signs with
pub fn test_credentials() -> SharedCredentialsProvider {
    SharedCredentialsProvider::new(Credentials::new(
        "AKIDTESTKEY",
        "test-secret-key",
        None,
        None,
        "tests",
    ))
}

/// S3 client signing with static test credentials against `endpoint`
pub fn create_s3_client(endpoint: &str) -> Arc<S3Client> {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("eu-west-3"))
        .credentials_provider(test_credentials())
        .endpoint_url(endpoint)
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        .build();

    Arc::new(S3Client::from_conf(config))
}

/// Signer using the static test credentials against `endpoint`
pub fn create_signer(endpoint: &str) -> S3UrlSigner {
    S3UrlSigner::new(
        create_s3_client(endpoint),
        Some(test_credentials()),
        TimeDelta::hours(1),
    )
}

/// Router wired to a fake store
pub struct TestContext {
    pub router: Router,
    pub environment: Environment,
    pub store: FakeStore,
    pub signer: Arc<S3UrlSigner>,
    pub uploader: Arc<UploadExecutor>,
    pub listing: Arc<BucketListing>,
}

impl TestContext {
    /// The store accepts `PUT` object requests carrying `Content-Type: text/plain`
    pub async fn new() -> Self {
        Self::with_store_rules(Method::PUT, Some("text/plain")).await
    }

    pub async fn with_store_rules(object_method: Method, content_type: Option<&str>) -> Self {
        setup_test_env();

        let store = FakeStore::start(&store_buckets(), object_method, content_type).await;
        Self::build(store, Some(test_credentials()), TEST_UPLOAD_TIMEOUT)
    }

    /// The store holds every `PUT` for a minute, uploads give up after `upload_timeout`
    pub async fn with_slow_store(upload_timeout: Duration) -> Self {
        setup_test_env();

        let store = FakeStore::start_with_put_delay(
            &store_buckets(),
            Method::PUT,
            Some("text/plain"),
            Duration::from_secs(60),
        )
        .await;
        Self::build(store, Some(test_credentials()), upload_timeout)
    }

    /// The signer checks credentials with `credentials_provider`
    pub async fn with_credentials_provider(credentials_provider: SharedCredentialsProvider) -> Self {
        setup_test_env();

        let store = FakeStore::start(&store_buckets(), Method::PUT, Some("text/plain")).await;
        Self::build(store, Some(credentials_provider), TEST_UPLOAD_TIMEOUT)
    }

    fn build(
        store: FakeStore,
        credentials_provider: Option<SharedCredentialsProvider>,
        upload_timeout: Duration,
    ) -> Self {
        let environment = development();

        let s3_client = create_s3_client(&store.endpoint);
        let signer = Arc::new(S3UrlSigner::new(
            s3_client.clone(),
            credentials_provider,
            TimeDelta::hours(1),
        ));
        let listing = Arc::new(BucketListing::new(s3_client));
        let uploader = Arc::new(UploadExecutor::new(upload_timeout));

        let dyn_signer: Arc<dyn UrlSigner> = signer.clone();
        let router = routes::handler(upload_timeout)
            .layer(Extension(environment.clone()))
            .layer(Extension(dyn_signer))
            .layer(Extension(listing.clone()))
            .layer(Extension(uploader.clone()))
            .into();

        Self {
            router,
            environment,
            store,
            signer,
            uploader,
            listing,
        }
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> Response {
        let mut builder = Request::builder().uri(route).method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

fn development() -> Environment {
    Environment::Development {
        presign_expiry_override: None,
    }
}

/// Buckets known to every fake store, including the configured default
fn store_buckets() -> Vec<String> {
    vec![
        TEST_BUCKET.to_string(),
        "empty-bucket".to_string(),
        development().s3_bucket(),
    ]
}

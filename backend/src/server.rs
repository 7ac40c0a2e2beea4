use std::sync::Arc;

use aide::openapi::OpenApi;
use aws_sdk_s3::Client as S3Client;
use axum::Extension;
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;

use crate::routes;
use crate::{
    listing::BucketListing,
    signer::{S3UrlSigner, UrlSigner},
    types::Environment,
    upload::UploadExecutor,
};

/// Components the routes depend on
pub struct Services {
    /// Issues presigned URLs
    pub signer: Arc<dyn UrlSigner>,
    /// Lists buckets
    pub listing: Arc<BucketListing>,
    /// Uploads through presigned URLs
    pub uploader: Arc<UploadExecutor>,
}

impl Services {
    /// Builds the S3-backed services for the given environment
    ///
    /// The signer checks credentials with the same provider the S3 client signs with.
    pub async fn from_environment(environment: &Environment) -> Self {
        let aws_config = environment.aws_config().await;
        let s3_client = Arc::new(S3Client::from_conf(
            environment.s3_client_config(&aws_config),
        ));

        Self {
            signer: Arc::new(S3UrlSigner::new(
                s3_client.clone(),
                aws_config.credentials_provider(),
                environment.max_presign_validity(),
            )),
            listing: Arc::new(BucketListing::new(s3_client)),
            uploader: Arc::new(UploadExecutor::new(environment.upload_timeout())),
        }
    }
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(environment: Environment, services: Services) -> anyhow::Result<()> {
    let mut openapi = OpenApi::default();

    let router = routes::handler(environment.upload_timeout())
        .finish_api(&mut openapi)
        .layer(Extension(Arc::new(openapi)))
        .layer(Extension(environment))
        .layer(Extension(services.signer))
        .layer(Extension(services.listing))
        .layer(Extension(services.uploader))
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default());

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Presign gateway started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

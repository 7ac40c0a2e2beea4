//! Presigned URL gateway for S3-compatible object storage

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![warn(missing_docs)]

/// Object listing
pub mod listing;

/// HTTP routes
pub mod routes;

/// Server startup
pub mod server;

/// Presigned URL issuance
pub mod signer;

/// Configuration, errors and extractors shared by the routes
pub mod types;

/// Uploads through presigned URLs
pub mod upload;

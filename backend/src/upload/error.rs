//! Error types for presigned uploads

use thiserror::Error;

/// Errors raised before an upload request is sent
///
/// Transport failures and rejections by the store are not errors, they are
/// reported through `UploadResult`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    /// The declared content type differs from the one the URL was signed with
    #[error("Content type mismatch: URL is bound to {expected}, got {declared}")]
    ContentTypeMismatch {
        /// Content type bound into the signature
        expected: String,
        /// Content type the caller declared
        declared: String,
    },
}

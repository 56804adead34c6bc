//! Storage abstraction trait
//!
//! This module defines the `DocumentStorage` trait that all storage backends
//! must implement.

use async_trait::async_trait;
use brix_core::models::StoredFile;
use brix_core::policy::ImageOptions;
use brix_core::StorageStrategy;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<brix_processing::ProcessingError> for StorageError {
    fn from(err: brix_processing::ProcessingError) -> Self {
        StorageError::ImageProcessing(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Implemented by the local filesystem and cloud backends. The document
/// service works against `Arc<dyn DocumentStorage>` and never touches
/// backend addressing directly.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Persist raw bytes under a backend-chosen unique name inside
    /// `target_path` and return the delivery URL.
    ///
    /// The name is the slugified original basename plus a random suffix, so
    /// concurrent uploads of the same file never collide. On failure no
    /// object becomes visible under its final name.
    async fn store_file(&self, file: &StoredFile, target_path: &str) -> StorageResult<String>;

    /// Like `store_file`, but pipes the buffer through the image
    /// resize/re-encode pipeline first. The stored filename carries the
    /// extension of the chosen output format, not the original's.
    async fn store_image(
        &self,
        file: &StoredFile,
        target_path: &str,
        options: &ImageOptions,
    ) -> StorageResult<String>;

    /// Re-derive the backend-native address from `url` and remove the
    /// object.
    ///
    /// Returns `false` (never an error) when the object is already absent or
    /// when extraction/removal fails; the cause is logged. Safe to call with
    /// unknown or malformed URLs.
    async fn delete_file(&self, url: &str) -> bool;

    /// Produce a time-limited delivery URL for a stored object.
    ///
    /// Backends without native access control (the local variant) return the
    /// original URL unchanged; callers must not assume enforcement when that
    /// variant is active.
    async fn get_signed_url(&self, url: &str, expires_in_secs: u64) -> StorageResult<String>;

    /// Deterministic URL construction from configuration and `path`. No I/O.
    fn get_public_url(&self, path: &str) -> String;

    /// Which backend variant this is.
    fn strategy(&self) -> StorageStrategy;
}

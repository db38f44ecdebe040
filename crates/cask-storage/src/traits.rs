//! Storage abstraction trait
//!
//! The deploy finalizer publishes staged files through this trait; backends
//! must make each write durable before returning.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob store consumed by the deploy pipeline.
///
/// **Key format:** forward-slash paths relative to the repository root,
/// mirroring the Maven layout (e.g. `com/example/lib/1.0/lib-1.0.jar`).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write an artifact at the given key. Must be durable on return; a
    /// partially written destination is removed before the error propagates.
    async fn write_artifact(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Check whether an artifact exists at the given key.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

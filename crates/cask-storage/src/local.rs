use crate::traits::{ArtifactStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem store laying files out in the standard Maven repository
/// structure under a base directory.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// # Arguments
    /// * `base_path` - Root directory of the repository (e.g. "data/repo")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create repository directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore { base_path })
    }

    /// Converts a storage key to a filesystem path. Rejects path traversal.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains invalid characters: {}",
                key
            )));
        }
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn write_artifact(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let result: std::io::Result<()> = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(path = %path.display(), key = %key, error = %e, "Artifact write failed");
            // do not leave a truncated artifact behind
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Artifact write successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}

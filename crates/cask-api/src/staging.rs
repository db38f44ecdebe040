//! Staging store: per-deploy temporary directories holding in-flight uploads.
//!
//! Each staging directory carries a `_metadata.edn` sidecar recording the
//! coordinate the directory is accumulating, and a zero-byte `.finalized`
//! sentinel once the deploy has been committed. The sidecar is the
//! server-side source of truth used to pick among the directories listed in
//! the client's session cookie.

use crate::session::UploadSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Sidecar record name. Not part of the artifact set.
pub const METADATA_FILE: &str = "_metadata.edn";

/// Zero-byte sentinel marking a finalized deploy; presence is the only signal.
pub const FINALIZED_SENTINEL: &str = ".finalized";

/// Sidecar record for one staging directory. Fields accumulate across PUTs;
/// a later write never clears a field that an earlier write set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StagingMetadata {
    pub group: Option<String>,
    pub group_path: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub timestamp_version: Option<String>,
}

impl StagingMetadata {
    /// Merge rule: the newer value wins only when it is set.
    pub fn merge(self, newer: StagingMetadata) -> StagingMetadata {
        StagingMetadata {
            group: newer.group.or(self.group),
            group_path: newer.group_path.or(self.group_path),
            name: newer.name.or(self.name),
            version: newer.version.or(self.version),
            timestamp_version: newer.timestamp_version.or(self.timestamp_version),
        }
    }

    /// Matching rule for session lookup: a requested field of `None`
    /// wildcards, and a sidecar field of `None` wildcards.
    pub fn matches(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        timestamp_version: Option<&str>,
    ) -> bool {
        fn field(want: Option<&str>, have: Option<&str>) -> bool {
            match (want, have) {
                (None, _) | (_, None) => true,
                (Some(w), Some(h)) => w == h,
            }
        }
        field(Some(group), self.group.as_deref())
            && field(Some(name), self.name.as_deref())
            && field(version, self.version.as_deref())
            && field(timestamp_version, self.timestamp_version.as_deref())
    }
}

/// Read the sidecar record; a missing or corrupt sidecar is empty.
pub async fn read_metadata(dir: &Path) -> StagingMetadata {
    let path = dir.join(METADATA_FILE);
    match fs::read_to_string(&path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => StagingMetadata::default(),
    }
}

/// Merge `fields` onto any existing sidecar and rewrite it.
pub async fn write_metadata(dir: &Path, fields: StagingMetadata) -> io::Result<()> {
    let merged = read_metadata(dir).await.merge(fields);
    let content = serde_json::to_string(&merged).map_err(io::Error::other)?;
    fs::write(dir.join(METADATA_FILE), content).await
}

pub async fn is_finalized(dir: &Path) -> bool {
    fs::try_exists(dir.join(FINALIZED_SENTINEL))
        .await
        .unwrap_or(false)
}

pub async fn mark_finalized(dir: &Path) -> io::Result<()> {
    fs::write(dir.join(FINALIZED_SENTINEL), b"").await
}

/// All regular files under the directory, recursively.
pub async fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Write one uploaded file. The write is atomic at the file level: on error
/// the partially written destination is deleted before the error propagates.
pub async fn save_file(dest: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    let result: io::Result<()> = async {
        let mut file = fs::File::create(dest).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
    .await;
    if let Err(e) = result {
        let _ = fs::remove_file(dest).await;
        return Err(e);
    }
    Ok(())
}

/// Resolves staging directories for incoming PUTs and serializes
/// finalization per directory.
#[derive(Clone)]
pub struct StagingStore {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl StagingStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Scan the session's directories in order and return the first whose
    /// sidecar matches; create a fresh `upload-<uuid>` directory on miss.
    pub async fn find_upload_dir(
        &self,
        group: &str,
        name: &str,
        version: Option<&str>,
        timestamp_version: Option<&str>,
        session: &UploadSession,
    ) -> io::Result<PathBuf> {
        for dir in &session.upload_dirs {
            if !dir.starts_with(&self.root) {
                continue;
            }
            if !fs::try_exists(dir).await.unwrap_or(false) {
                continue;
            }
            let meta = read_metadata(dir).await;
            if meta.matches(group, name, version, timestamp_version) {
                return Ok(dir.clone());
            }
        }

        let dir = self.root.join(format!("upload-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), group = %group, name = %name, "Created staging directory");
        Ok(dir)
    }

    /// Per-directory finalization lock, created on first use.
    pub async fn finalize_lock(&self, dir: &Path) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock().await;
        guard
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

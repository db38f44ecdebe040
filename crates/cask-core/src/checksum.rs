//! File utilities: checksum computation, sidecar verification, path subtraction.
//!
//! Maven clients upload `.md5`/`.sha1` sidecars next to every artifact file;
//! the server recomputes digests and compares against the sidecar content.

use md5::Md5;
use sha1::{Digest, Sha1};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Checksum algorithms understood on the deploy surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgo {
    Md5,
    Sha1,
}

impl ChecksumAlgo {
    pub const ALL: [ChecksumAlgo; 2] = [ChecksumAlgo::Md5, ChecksumAlgo::Sha1];

    /// Sidecar file extension (`md5` / `sha1`).
    pub fn ext(&self) -> &'static str {
        match self {
            ChecksumAlgo::Md5 => "md5",
            ChecksumAlgo::Sha1 => "sha1",
        }
    }
}

/// Hex digest of a file's content.
pub async fn file_checksum(path: &Path, algo: ChecksumAlgo) -> io::Result<String> {
    let data = fs::read(path).await?;
    Ok(digest(&data, algo))
}

/// Hex digest of a byte slice.
pub fn digest(data: &[u8], algo: ChecksumAlgo) -> String {
    match algo {
        ChecksumAlgo::Md5 => hex::encode(Md5::digest(data)),
        ChecksumAlgo::Sha1 => hex::encode(Sha1::digest(data)),
    }
}

/// Sibling sidecar path for a file: `F` -> `F.<algo>`.
pub fn checksum_file(path: &Path, algo: ChecksumAlgo) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push('.');
    name.push_str(algo.ext());
    path.with_file_name(name)
}

/// True iff the sidecar exists and its content equals the file's digest.
///
/// Maven tooling writes digests with varying whitespace and sometimes an
/// appended filename, so only the leading hex token is compared.
pub async fn valid_checksum_file(path: &Path, algo: ChecksumAlgo) -> io::Result<bool> {
    let sidecar = checksum_file(path, algo);
    if !fs::try_exists(&sidecar).await.unwrap_or(false) {
        return Ok(false);
    }
    let expected = file_checksum(path, algo).await?;
    let content = fs::read_to_string(&sidecar).await?;
    let actual = content.split_whitespace().next().unwrap_or("");
    Ok(actual.eq_ignore_ascii_case(&expected))
}

/// Strip `root` from `child`, returning the remainder as a forward-slash
/// relative key. Returns `None` when `child` is not under `root`.
pub fn subpath(root: &Path, child: &Path) -> Option<String> {
    let rel = child.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

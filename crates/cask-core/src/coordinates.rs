//! Maven coordinates (group/artifact/version) and version-string helpers.

use crate::error::DeployError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.-]+$").expect("name regex"));

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.+-]+$").expect("version regex"));

/// Timestamp-expanded snapshot form embedded in a filename, e.g.
/// `lib-1.0-20240101.010101-1.jar` carries `20240101.010101-1`.
static TIMESTAMP_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}\.\d{6}-\d+").expect("timestamp version regex"));

/// A Maven coordinate as derived from the upload path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Enforce the character rules for group, artifact, and version.
    pub fn validate(&self) -> Result<(), DeployError> {
        if !NAME_RE.is_match(&self.group) {
            return Err(DeployError::RegexValidationFailed(format!(
                "group name {} is not valid, must match {}",
                self.group,
                NAME_RE.as_str()
            )));
        }
        if !NAME_RE.is_match(&self.artifact) {
            return Err(DeployError::RegexValidationFailed(format!(
                "artifact name {} is not valid, must match {}",
                self.artifact,
                NAME_RE.as_str()
            )));
        }
        if !VERSION_RE.is_match(&self.version) {
            return Err(DeployError::RegexValidationFailed(format!(
                "version {} is not valid, must match {}",
                self.version,
                VERSION_RE.as_str()
            )));
        }
        Ok(())
    }

    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }
}

/// Snapshot versions may be republished; everything else is write-once.
pub fn is_snapshot_version(version: &str) -> bool {
    version.ends_with("-SNAPSHOT")
}

/// Whether a path segment is shaped like a version string.
pub fn is_version_string(segment: &str) -> bool {
    VERSION_RE.is_match(segment)
}

/// Dotted group name to on-disk path form (`com.example` -> `com/example`).
pub fn group_path(group: &str) -> String {
    group.replace('.', "/")
}

/// Slash-encoded wire form back to the dotted group name.
pub fn group_from_path(path: &str) -> String {
    path.trim_matches('/').replace('/', ".")
}

/// Extract the timestamp version (`yyyyMMdd.HHmmss-build`) from a snapshot
/// upload filename, if present. `maven-metadata.xml` and base-version
/// filenames carry none.
pub fn timestamp_version_of(filename: &str) -> Option<String> {
    TIMESTAMP_VERSION_RE
        .find(filename)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        let coords = Coordinates::new("com.example", "my-lib", "1.0.0");
        assert!(coords.validate().is_ok());
    }

    #[test]
    fn test_uppercase_group_rejected() {
        let coords = Coordinates::new("com.Example", "lib", "1.0");
        let err = coords.validate().unwrap_err();
        assert_eq!(err.tag(), "regex-validation-failed");
        assert!(err.to_string().contains("com.Example"));
    }

    #[test]
    fn test_artifact_with_slash_rejected() {
        let coords = Coordinates::new("com.example", "a/b", "1.0");
        assert!(coords.validate().is_err());
    }

    #[test]
    fn test_version_allows_plus_and_uppercase() {
        let coords = Coordinates::new("com.example", "lib", "1.0.0+build.7-SNAPSHOT");
        assert!(coords.validate().is_ok());
        assert!(coords.is_snapshot());
    }

    #[test]
    fn test_version_with_space_rejected() {
        let coords = Coordinates::new("com.example", "lib", "1 0");
        assert!(coords.validate().is_err());
    }

    #[test]
    fn test_group_path_round_trip() {
        assert_eq!(group_path("com.example.libs"), "com/example/libs");
        assert_eq!(group_from_path("com/example/libs"), "com.example.libs");
        assert_eq!(group_from_path("/com/example/"), "com.example");
    }

    #[test]
    fn test_timestamp_version_extraction() {
        assert_eq!(
            timestamp_version_of("lib-1.0-20240101.010101-1.jar"),
            Some("20240101.010101-1".to_string())
        );
        assert_eq!(
            timestamp_version_of("lib-1.0-20240101.010101-12.pom.asc"),
            Some("20240101.010101-12".to_string())
        );
        assert_eq!(timestamp_version_of("maven-metadata.xml"), None);
        assert_eq!(timestamp_version_of("lib-1.0-SNAPSHOT.jar"), None);
    }
}

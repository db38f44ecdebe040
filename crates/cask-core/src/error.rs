//! Error types module
//!
//! All deploy failures are unified under the `DeployError` enum. Each variant
//! self-describes its wire tag, HTTP status, and log level so the HTTP layer
//! can render a response without matching on variants again.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so the core crate stays database-agnostic by default.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("{0}")]
    RegexValidationFailed(String),

    #[error("{0}")]
    PomEntryMismatch(String),

    #[error("{0}")]
    NonSnapshotRedeploy(String),

    #[error("{0}")]
    CentralShadow(String),

    #[error("failed to check maven central for {0}")]
    CentralShadowCheckFailure(String),

    #[error("{0}")]
    MissingJarFile(String),

    #[error("no checksum provided for {0}")]
    FileMissingChecksum(String),

    #[error("invalid checksum for {0}")]
    FileInvalidChecksum(String),

    #[error("no signature provided for {0}")]
    FileMissingSignature(String),

    #[error("no pom file was uploaded for {0}")]
    MissingPomFile(String),

    #[error("could not parse pom file {0}")]
    InvalidPomFile(String),

    #[error("could not parse maven-metadata.xml {0}")]
    InvalidMavenMetadataFile(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PasswordRejection(String),

    #[cfg(feature = "sqlx")]
    #[error("database error: {0}")]
    Database(#[source] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// Wire tag carried in audit logs and error reports.
    pub fn tag(&self) -> &'static str {
        match self {
            DeployError::RegexValidationFailed(_) => "regex-validation-failed",
            DeployError::PomEntryMismatch(_) => "pom-entry-mismatch",
            DeployError::NonSnapshotRedeploy(_) => "non-snapshot-redeploy",
            DeployError::CentralShadow(_) => "central-shadow",
            DeployError::CentralShadowCheckFailure(_) => "central-shadow-check-failure",
            DeployError::MissingJarFile(_) => "missing-jar-file",
            DeployError::FileMissingChecksum(_) => "file-missing-checksum",
            DeployError::FileInvalidChecksum(_) => "file-invalid-checksum",
            DeployError::FileMissingSignature(_) => "file-missing-signature",
            DeployError::MissingPomFile(_) => "missing-pom-file",
            DeployError::InvalidPomFile(_) => "invalid-pom-file",
            DeployError::InvalidMavenMetadataFile(_) => "invalid-maven-metadata-file",
            DeployError::Forbidden(_) => "deploy-forbidden",
            DeployError::PasswordRejection(_) => "deploy-password-rejection",
            #[cfg(feature = "sqlx")]
            DeployError::Database(_) => "internal-error",
            DeployError::Io(_) => "internal-error",
            DeployError::Internal(_) => "internal-error",
        }
    }

    /// HTTP status for the response. Deploy failures default to 403.
    pub fn status(&self) -> u16 {
        match self {
            DeployError::PasswordRejection(_) => 401,
            DeployError::CentralShadowCheckFailure(_) => 503,
            _ => 403,
        }
    }

    /// True for user errors raised by validation. These are audit-logged at
    /// the point of rejection but never sent to the error reporter, and the
    /// finalizer re-raises them unchanged instead of reclassifying.
    pub fn is_validation(&self) -> bool {
        match self {
            DeployError::Io(_) | DeployError::Internal(_) => false,
            #[cfg(feature = "sqlx")]
            DeployError::Database(_) => false,
            _ => true,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            DeployError::CentralShadowCheckFailure(_) => LogLevel::Warn,
            #[cfg(feature = "sqlx")]
            DeployError::Database(_) => LogLevel::Error,
            DeployError::Io(_) | DeployError::Internal(_) => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }

    /// Short human message for the `status-message` response header.
    pub fn status_message(&self) -> String {
        match self.status() {
            401 => format!("Unauthorized - {}", self),
            503 => format!("Service Unavailable - {}", self),
            _ => format!("Forbidden - {}", self),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for DeployError {
    fn from(err: SqlxError) -> Self {
        DeployError::Database(err)
    }
}

impl From<anyhow::Error> for DeployError {
    fn from(err: anyhow::Error) -> Self {
        DeployError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_keep_their_tag() {
        let err = DeployError::FileInvalidChecksum("lib-1.0.jar.sha1".to_string());
        assert_eq!(err.tag(), "file-invalid-checksum");
        assert_eq!(err.status(), 403);
        assert!(err.is_validation());
    }

    #[test]
    fn test_central_check_failure_is_503() {
        let err = DeployError::CentralShadowCheckFailure("com.ex/lib".to_string());
        assert_eq!(err.status(), 503);
        assert!(err.status_message().starts_with("Service Unavailable - "));
    }

    #[test]
    fn test_password_rejection_is_401() {
        let err = DeployError::PasswordRejection("a deploy token is required".to_string());
        assert_eq!(err.status(), 401);
        assert_eq!(
            err.status_message(),
            "Unauthorized - a deploy token is required"
        );
    }

    #[test]
    fn test_io_errors_are_not_validation() {
        let err = DeployError::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_validation());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert_eq!(err.status(), 403);
    }
}

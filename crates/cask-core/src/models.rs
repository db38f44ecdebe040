//! Domain models shared across the cask components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published artifact release as recorded in the metadata database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JarRecord {
    pub id: Uuid,
    pub group_name: String,
    pub jar_name: String,
    pub version: String,
    pub username: String,
    pub description: Option<String>,
    pub packaging: String,
    pub created_at: DateTime<Utc>,
}

/// A deploy token credential.
///
/// Tokens may be unscoped, group-scoped, or group+artifact-scoped; the scope
/// fields mirror that directly. The raw token is never stored, only its
/// argon2 hash plus a prefix for indexed lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployToken {
    pub id: Uuid,
    pub username: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub group_name: Option<String>,
    pub jar_name: Option<String>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl DeployToken {
    /// Token-scope rule: a request targeting `(group, artifact)` is covered
    /// iff the token is unscoped, group-scoped to that group, or scoped to
    /// exactly that group and artifact.
    pub fn allows(&self, group: &str, artifact: &str) -> bool {
        match (self.group_name.as_deref(), self.jar_name.as_deref()) {
            (None, _) => true,
            (Some(g), None) => g == group,
            (Some(g), Some(a)) => g == group && a == artifact,
        }
    }
}

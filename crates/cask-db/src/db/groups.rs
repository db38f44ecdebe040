//! Group membership repository: reads and claims over the group_memberships table.

use cask_core::DeployError;
use sqlx::PgPool;

/// Repository for group memberships.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Usernames permitted to deploy under the group. Empty means the group
    /// is unclaimed.
    #[tracing::instrument(skip(self), fields(db.table = "group_memberships"))]
    pub async fn active_names(&self, group: &str) -> Result<Vec<String>, DeployError> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT username FROM group_memberships WHERE group_name = $1",
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    /// Verify membership, claiming the group for `username` on first use.
    /// Fails with `deploy-forbidden` when the group belongs to others.
    #[tracing::instrument(skip(self), fields(db.table = "group_memberships"))]
    pub async fn check_and_add(&self, username: &str, group: &str) -> Result<(), DeployError> {
        let active = self.active_names(group).await?;
        if active.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO group_memberships (group_name, username)
                VALUES ($1, $2)
                ON CONFLICT (group_name, username) DO NOTHING
                "#,
            )
            .bind(group)
            .bind(username)
            .execute(&self.pool)
            .await?;
            tracing::info!(group = %group, username = %username, "Group claimed on first deploy");
            return Ok(());
        }
        if active.iter().any(|n| n == username) {
            return Ok(());
        }
        Err(DeployError::Forbidden(format!(
            "{} does not have access to the {} group",
            username, group
        )))
    }
}

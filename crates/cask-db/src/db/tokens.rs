//! Deploy token repository: prefix-indexed credential lookup.

use cask_core::{DeployError, DeployToken};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Row type for the deploy_tokens table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct DeployTokenRow {
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

impl DeployTokenRow {
    pub fn into_token(self) -> DeployToken {
        DeployToken {
            id: self.id,
            username: self.username,
            token_prefix: self.token_prefix,
            token_hash: self.token_hash,
            group_name: self.group_name,
            jar_name: self.jar_name,
            disabled: self.disabled,
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        }
    }
}

/// Repository for deploy tokens.
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Candidate tokens by prefix. The raw token is verified against each
    /// candidate's hash by the caller.
    #[tracing::instrument(skip(self), fields(db.table = "deploy_tokens"))]
    pub async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<DeployToken>, DeployError> {
        let rows: Vec<DeployTokenRow> = sqlx::query_as(
            r#"
            SELECT id, username, token_prefix, token_hash, group_name, jar_name,
                   disabled, created_at, last_used_at
            FROM deploy_tokens
            WHERE token_prefix = $1 AND NOT disabled
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DeployTokenRow::into_token).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "deploy_tokens", db.record_id = %id))]
    pub async fn update_last_used(&self, id: Uuid) -> Result<(), DeployError> {
        sqlx::query("UPDATE deploy_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

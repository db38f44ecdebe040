//! Metadata database layer for the cask artifact repository.
//!
//! The deploy pipeline consumes the [MetadataDb] trait; [PgMetadataDb] is
//! the Postgres implementation built on the sqlx repositories in [db].

pub mod db;

use async_trait::async_trait;
use cask_core::{DeployError, DeployToken, JarRecord, PomData};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub use db::{GroupRepository, JarRepository, TokenRepository};

/// Metadata database operations consumed by the deploy pipeline.
#[async_trait]
pub trait MetadataDb: Send + Sync {
    /// Usernames permitted to deploy under `group`; empty when unclaimed.
    async fn group_active_names(&self, group: &str) -> Result<Vec<String>, DeployError>;

    /// Verify membership, claiming the group on first use.
    async fn check_and_add_group(&self, username: &str, group: &str) -> Result<(), DeployError>;

    /// Most recent release record for a coordinate.
    async fn find_jar(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<Option<JarRecord>, DeployError>;

    /// Record a deploy.
    async fn add_jar(&self, username: &str, pom: &PomData) -> Result<(), DeployError>;

    /// Candidate deploy tokens by prefix for credential verification.
    async fn find_tokens_by_prefix(&self, prefix: &str) -> Result<Vec<DeployToken>, DeployError>;

    /// Touch a token's last-used timestamp.
    async fn update_token_last_used(&self, id: Uuid) -> Result<(), DeployError>;
}

/// Postgres-backed [MetadataDb].
#[derive(Clone)]
pub struct PgMetadataDb {
    groups: GroupRepository,
    jars: JarRepository,
    tokens: TokenRepository,
}

impl PgMetadataDb {
    pub fn new(pool: PgPool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            jars: JarRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool),
        }
    }
}

#[async_trait]
impl MetadataDb for PgMetadataDb {
    async fn group_active_names(&self, group: &str) -> Result<Vec<String>, DeployError> {
        self.groups.active_names(group).await
    }

    async fn check_and_add_group(&self, username: &str, group: &str) -> Result<(), DeployError> {
        self.groups.check_and_add(username, group).await
    }

    async fn find_jar(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<Option<JarRecord>, DeployError> {
        self.jars.find_jar(group, artifact, version).await
    }

    async fn add_jar(&self, username: &str, pom: &PomData) -> Result<(), DeployError> {
        self.jars.add_jar(username, pom).await?;
        Ok(())
    }

    async fn find_tokens_by_prefix(&self, prefix: &str) -> Result<Vec<DeployToken>, DeployError> {
        self.tokens.find_by_prefix(prefix).await
    }

    async fn update_token_last_used(&self, id: Uuid) -> Result<(), DeployError> {
        self.tokens.update_last_used(id).await
    }
}

/// Connect a pool and run pending migrations.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    timeout_seconds: u64,
) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_seconds))
        .connect(database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

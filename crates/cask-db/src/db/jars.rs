//! Jar repository: the authoritative record of published releases.

use cask_core::{DeployError, JarRecord, PomData};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Row type for the jars table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct JarRow {
    pub id: Uuid,
    pub group_name: String,
    pub jar_name: String,
    pub version: String,
    pub username: String,
    pub description: Option<String>,
    pub packaging: String,
    pub created_at: DateTime<Utc>,
}

impl JarRow {
    pub fn into_record(self) -> JarRecord {
        JarRecord {
            id: self.id,
            group_name: self.group_name,
            jar_name: self.jar_name,
            version: self.version,
            username: self.username,
            description: self.description,
            packaging: self.packaging,
            created_at: self.created_at,
        }
    }
}

/// Repository for the jars table.
#[derive(Clone)]
pub struct JarRepository {
    pool: PgPool,
}

impl JarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent record for a coordinate, if any.
    #[tracing::instrument(skip(self), fields(db.table = "jars"))]
    pub async fn find_jar(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<Option<JarRecord>, DeployError> {
        let row: Option<JarRow> = sqlx::query_as(
            r#"
            SELECT id, group_name, jar_name, version, username, description, packaging, created_at
            FROM jars
            WHERE group_name = $1 AND jar_name = $2 AND version = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(group)
        .bind(artifact)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JarRow::into_record))
    }

    /// Record a deploy. The partial unique index on non-snapshot coordinates
    /// backs the validator's redeploy check against races.
    #[tracing::instrument(skip(self, pom), fields(db.table = "jars", group = %pom.group, jar = %pom.name, version = %pom.version))]
    pub async fn add_jar(&self, username: &str, pom: &PomData) -> Result<JarRecord, DeployError> {
        let row: JarRow = sqlx::query_as(
            r#"
            INSERT INTO jars (group_name, jar_name, version, username, description, packaging)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, group_name, jar_name, version, username, description, packaging, created_at
            "#,
        )
        .bind(&pom.group)
        .bind(&pom.name)
        .bind(&pom.version)
        .bind(username)
        .bind(&pom.description)
        .bind(&pom.packaging)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_record())
    }
}

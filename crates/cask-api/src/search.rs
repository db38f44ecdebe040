//! Search indexing collaborator.
//!
//! Indexing is best-effort: the finalizer spawns it in the background and a
//! failure never fails the deploy.

use async_trait::async_trait;
use cask_core::PomData;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index one release; `at` is the POM file's modification time.
    async fn index(&self, pom: &PomData, at: DateTime<Utc>) -> Result<(), anyhow::Error>;
}

/// HTTP client posting release documents to the search service.
pub struct HttpSearchIndex {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSearchIndex {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn index(&self, pom: &PomData, at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        let document = serde_json::json!({
            "group_id": pom.group,
            "artifact_id": pom.name,
            "version": pom.version,
            "description": pom.description,
            "url": pom.url,
            "at": at.timestamp_millis(),
        });
        self.client
            .post(&self.endpoint)
            .json(&document)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(
            group = %pom.group,
            artifact = %pom.name,
            version = %pom.version,
            "Release indexed for search"
        );
        Ok(())
    }
}

/// Used when no search endpoint is configured.
pub struct NoopSearchIndex;

#[async_trait]
impl SearchIndex for NoopSearchIndex {
    async fn index(&self, pom: &PomData, _at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        tracing::debug!(
            group = %pom.group,
            artifact = %pom.name,
            "Search indexing disabled, skipping"
        );
        Ok(())
    }
}

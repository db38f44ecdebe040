//! Maven Central shadow probe.
//!
//! Publishing a coordinate that also exists on Central would shadow the
//! upstream artifact for every client resolving through this repository, so
//! the validator probes Central before accepting a deploy.

use async_trait::async_trait;

#[async_trait]
pub trait CentralLookup: Send + Sync {
    /// Whether `(group, artifact)` exists on Maven Central. An `Err` means
    /// the probe itself failed and the deploy must be retried later.
    async fn exists(&self, group: &str, artifact: &str) -> Result<bool, anyhow::Error>;
}

/// Queries the Central search API (solrsearch).
pub struct HttpCentralClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCentralClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl CentralLookup for HttpCentralClient {
    async fn exists(&self, group: &str, artifact: &str) -> Result<bool, anyhow::Error> {
        let query = format!(r#"g:"{}" AND a:"{}""#, group, artifact);
        let response: serde_json::Value = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.as_str()), ("rows", "1"), ("wt", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let num_found = response
            .pointer("/response/numFound")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow::anyhow!("unexpected central search response shape"))?;
        Ok(num_found > 0)
    }
}

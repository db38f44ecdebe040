//! Configuration module
//!
//! Env-var driven configuration for the deploy surface. A `.env` file is
//! honored in development via [load_dotenv].

use std::env;
use std::path::PathBuf;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 200 * 1024 * 1024;
const DEFAULT_CENTRAL_SEARCH_URL: &str = "https://search.maven.org/solrsearch/select";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Root of the on-disk repository the blob store writes to and GET
    /// requests are served from.
    pub repo_path: PathBuf,
    /// Root under which per-deploy staging directories are created.
    /// Defaults to the OS temp dir.
    pub staging_root: Option<PathBuf>,
    /// Secret for signing the upload-session cookie.
    pub session_secret: String,
    pub max_body_bytes: usize,
    pub central_search_url: String,
    /// `group:artifact` pairs permitted to shadow Maven Central.
    pub central_allowlist: Vec<(String, String)>,
    /// Search indexing endpoint; indexing is skipped when unset.
    pub search_index_url: Option<String>,
    pub environment: String,
}

/// Load `.env` if present. Call before reading configuration.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET must be set"))?;
        if session_secret.len() < 32 {
            anyhow::bail!("SESSION_SECRET must be at least 32 characters");
        }
        let repo_path = env::var("REPO_PATH").unwrap_or_else(|_| "data/repo".to_string());

        Ok(Config {
            server_port: parse_env("PORT", 8001)?,
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            repo_path: PathBuf::from(repo_path),
            staging_root: env::var("STAGING_ROOT").ok().map(PathBuf::from),
            session_secret,
            max_body_bytes: parse_env("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            central_search_url: env::var("CENTRAL_SEARCH_URL")
                .unwrap_or_else(|_| DEFAULT_CENTRAL_SEARCH_URL.to_string()),
            central_allowlist: parse_allowlist(
                &env::var("CENTRAL_SHADOW_ALLOWLIST").unwrap_or_default(),
            ),
            search_index_url: env::var("SEARCH_INDEX_URL").ok().filter(|s| !s.is_empty()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Staging root, falling back to the OS temp dir.
    pub fn staging_root_or_tmp(&self) -> PathBuf {
        self.staging_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated `group:artifact` allowlist.
fn parse_allowlist(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (group, artifact) = entry.split_once(':')?;
            if group.is_empty() || artifact.is_empty() {
                return None;
            }
            Some((group.to_string(), artifact.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowlist() {
        let list = parse_allowlist("com.ex:lib, org.other:thing ,bad-entry,:x");
        assert_eq!(
            list,
            vec![
                ("com.ex".to_string(), "lib".to_string()),
                ("org.other".to_string(), "thing".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_allowlist_empty() {
        assert!(parse_allowlist("").is_empty());
    }
}

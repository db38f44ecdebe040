//! Test helpers: build an AppState with in-memory collaborators and an
//! axum-test server with cookie persistence, so deploys can replay their
//! session across PUTs the way a Maven client does.

use async_trait::async_trait;
use axum_test::{TestServer, TestServerConfig};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cask_api::auth::token;
use cask_api::deploy::central::CentralLookup;
use cask_api::reporter::LogReporter;
use cask_api::search::SearchIndex;
use cask_api::session::SessionCodec;
use cask_api::setup::routes::build_router;
use cask_api::staging::StagingStore;
use cask_api::state::AppState;
use cask_core::{Config, DeployError, DeployToken, JarRecord, PomData};
use cask_db::MetadataDb;
use cask_storage::LocalStore;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_USER: &str = "alice";

/// In-memory MetadataDb for testing without a database.
#[derive(Default)]
pub struct MemoryDb {
    pub groups: Mutex<HashMap<String, Vec<String>>>,
    pub jars: Mutex<Vec<JarRecord>>,
    pub tokens: Mutex<Vec<DeployToken>>,
}

impl MemoryDb {
    pub fn jar_count(&self) -> usize {
        self.jars.lock().unwrap().len()
    }

    pub fn add_token(&self, token: DeployToken) {
        self.tokens.lock().unwrap().push(token);
    }
}

#[async_trait]
impl MetadataDb for MemoryDb {
    async fn group_active_names(&self, group: &str) -> Result<Vec<String>, DeployError> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    async fn check_and_add_group(&self, username: &str, group: &str) -> Result<(), DeployError> {
        let mut groups = self.groups.lock().unwrap();
        let members = groups.entry(group.to_string()).or_default();
        if members.is_empty() {
            members.push(username.to_string());
            return Ok(());
        }
        if members.iter().any(|m| m == username) {
            return Ok(());
        }
        Err(DeployError::Forbidden(format!(
            "{} does not have access to the {} group",
            username, group
        )))
    }

    async fn find_jar(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<Option<JarRecord>, DeployError> {
        Ok(self
            .jars
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.group_name == group && j.jar_name == artifact && j.version == version)
            .cloned())
    }

    async fn add_jar(&self, username: &str, pom: &PomData) -> Result<(), DeployError> {
        self.jars.lock().unwrap().push(JarRecord {
            id: Uuid::new_v4(),
            group_name: pom.group.clone(),
            jar_name: pom.name.clone(),
            version: pom.version.clone(),
            username: username.to_string(),
            description: pom.description.clone(),
            packaging: pom.packaging.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_tokens_by_prefix(&self, prefix: &str) -> Result<Vec<DeployToken>, DeployError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.token_prefix == prefix && !t.disabled)
            .cloned()
            .collect())
    }

    async fn update_token_last_used(&self, id: Uuid) -> Result<(), DeployError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(t) = tokens.iter_mut().find(|t| t.id == id) {
            t.last_used_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// Central probe fake: a fixed set of coordinates, optionally failing
/// outright to exercise the 503 path.
#[derive(Default)]
pub struct StaticCentral {
    pub present: HashSet<(String, String)>,
    pub fail: bool,
}

#[async_trait]
impl CentralLookup for StaticCentral {
    async fn exists(&self, group: &str, artifact: &str) -> Result<bool, anyhow::Error> {
        if self.fail {
            anyhow::bail!("central unreachable");
        }
        Ok(self
            .present
            .contains(&(group.to_string(), artifact.to_string())))
    }
}

/// Search fake recording every indexed release.
#[derive(Default)]
pub struct RecordingSearch {
    pub calls: Mutex<Vec<(PomData, DateTime<Utc>)>>,
}

impl RecordingSearch {
    pub fn indexed(&self) -> Vec<(PomData, DateTime<Utc>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for RecordingSearch {
    async fn index(&self, pom: &PomData, at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        self.calls.lock().unwrap().push((pom.clone(), at));
        Ok(())
    }
}

/// Test application: server plus shared handles to the fakes.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<MemoryDb>,
    pub search: Arc<RecordingSearch>,
    pub repo_dir: TempDir,
    pub staging_dir: TempDir,
    pub raw_token: String,
}

impl TestApp {
    /// `Authorization` header value for the test account's deploy token.
    pub fn auth_header(&self) -> String {
        basic_auth(TEST_USER, &self.raw_token)
    }

    pub fn repo_path(&self) -> PathBuf {
        self.repo_dir.path().to_path_buf()
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Build a token for `username` with the given scope, returning the raw
/// token and the stored record.
pub fn make_token(
    username: &str,
    group_name: Option<&str>,
    jar_name: Option<&str>,
) -> (String, DeployToken) {
    let raw = token::generate_token();
    let record = DeployToken {
        id: Uuid::new_v4(),
        username: username.to_string(),
        token_prefix: token::token_prefix(&raw),
        token_hash: token::hash_token(&raw).expect("hash token"),
        group_name: group_name.map(String::from),
        jar_name: jar_name.map(String::from),
        disabled: false,
        created_at: Utc::now(),
        last_used_at: None,
    };
    (raw, record)
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(StaticCentral::default()).await
}

/// Setup with a custom central probe fake.
pub async fn setup_test_app_with(central: StaticCentral) -> TestApp {
    let repo_dir = tempfile::tempdir().expect("repo tempdir");
    let staging_dir = tempfile::tempdir().expect("staging tempdir");

    let db = Arc::new(MemoryDb::default());
    let search = Arc::new(RecordingSearch::default());

    let (raw_token, record) = make_token(TEST_USER, None, None);
    db.add_token(record);

    let config = Config {
        server_port: 0,
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        repo_path: repo_dir.path().to_path_buf(),
        staging_root: Some(staging_dir.path().to_path_buf()),
        session_secret: "test-session-secret-at-least-32-chars!!".to_string(),
        max_body_bytes: 16 * 1024 * 1024,
        central_search_url: "http://localhost:1/unused".to_string(),
        central_allowlist: Vec::new(),
        search_index_url: None,
        environment: "test".to_string(),
    };

    let store = LocalStore::new(repo_dir.path())
        .await
        .expect("local store");

    let state = Arc::new(AppState {
        db: db.clone(),
        store: Arc::new(store),
        search: search.clone(),
        central: Arc::new(central),
        reporter: Arc::new(LogReporter),
        sessions: SessionCodec::new(&config.session_secret),
        staging: StagingStore::new(config.staging_root_or_tmp()),
        config,
    });

    let router = build_router(state);
    let server_config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    let server = TestServer::new_with_config(router, server_config).expect("test server");

    TestApp {
        server,
        db,
        search,
        repo_dir,
        staging_dir,
        raw_token,
    }
}

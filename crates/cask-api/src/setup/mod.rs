//! Application wiring: database, storage, collaborators, routes.

pub mod routes;
pub mod server;

use crate::deploy::central::HttpCentralClient;
use crate::reporter::LogReporter;
use crate::search::{HttpSearchIndex, NoopSearchIndex, SearchIndex};
use crate::session::SessionCodec;
use crate::staging::StagingStore;
use crate::state::AppState;
use axum::Router;
use cask_core::Config;
use cask_db::PgMetadataDb;
use cask_storage::LocalStore;
use std::sync::Arc;

/// Connect collaborators and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = cask_db::connect(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout_seconds,
    )
    .await?;

    let store = LocalStore::new(&config.repo_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open repository: {}", e))?;

    let search: Arc<dyn SearchIndex> = match &config.search_index_url {
        Some(url) => Arc::new(HttpSearchIndex::new(url.clone())),
        None => Arc::new(NoopSearchIndex),
    };

    let state = Arc::new(AppState {
        db: Arc::new(PgMetadataDb::new(pool)),
        store: Arc::new(store),
        search,
        central: Arc::new(HttpCentralClient::new(config.central_search_url.clone())),
        reporter: Arc::new(LogReporter),
        sessions: SessionCodec::new(&config.session_secret),
        staging: StagingStore::new(config.staging_root_or_tmp()),
        config,
    });

    let router = routes::build_router(state.clone());
    Ok((state, router))
}

//! Application state.
//!
//! Collaborators are trait objects so the deploy pipeline never touches a
//! concrete backend, and integration tests can swap in fakes. The database
//! handle is passed through this state explicitly rather than made ambient.

use crate::deploy::central::CentralLookup;
use crate::reporter::ErrorReporter;
use crate::search::SearchIndex;
use crate::session::SessionCodec;
use crate::staging::StagingStore;
use cask_core::Config;
use cask_db::MetadataDb;
use cask_storage::ArtifactStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn MetadataDb>,
    pub store: Arc<dyn ArtifactStore>,
    pub search: Arc<dyn SearchIndex>,
    pub central: Arc<dyn CentralLookup>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub sessions: SessionCodec,
    pub staging: StagingStore,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}

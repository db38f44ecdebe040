//! Deploy finalization: the one-shot commit of a staged deploy to durable
//! storage, the metadata database, and (asynchronously) the search index.

use crate::auth::Identity;
use crate::deploy::validate::validate_deploy;
use crate::staging::{self, FINALIZED_SENTINEL, METADATA_FILE};
use crate::state::AppState;
use cask_core::checksum::{self, ChecksumAlgo};
use cask_core::coordinates;
use cask_core::pom::{parse_maven_metadata, parse_pom};
use cask_core::{Coordinates, DeployError};
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;

/// Finalize one staging directory. Finalization is serialized per directory;
/// a second caller that loses the race observes the sentinel and returns.
///
/// Validation failures are re-raised unchanged; any other failure is
/// reclassified as `deploy-forbidden`.
pub async fn finalize_deploy(
    state: &AppState,
    identity: &Identity,
    dir: &Path,
) -> Result<(), DeployError> {
    let lock = state.staging.finalize_lock(dir).await;
    let _guard = lock.lock().await;

    if staging::is_finalized(dir).await {
        tracing::debug!(dir = %dir.display(), "Already finalized, skipping");
        return Ok(());
    }

    match run_finalize(state, identity, dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_validation() => Err(e),
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "Unexpected failure during finalization");
            Err(DeployError::Forbidden(format!("deploy failed: {}", e)))
        }
    }
}

async fn run_finalize(
    state: &AppState,
    identity: &Identity,
    dir: &Path,
) -> Result<(), DeployError> {
    let meta = staging::read_metadata(dir).await;

    // 1. locate the pom
    let files = staging::list_files(dir).await?;
    let pom_path = files
        .iter()
        .find(|f| {
            f.file_name()
                .map(|n| n.to_string_lossy().ends_with(".pom"))
                .unwrap_or(false)
        })
        .cloned()
        .ok_or_else(|| {
            DeployError::MissingPomFile(format!(
                "{}/{}",
                meta.group.as_deref().unwrap_or("unknown"),
                meta.name.as_deref().unwrap_or("unknown")
            ))
        })?;

    // 2. parse it
    let pom = parse_pom(&pom_path).await?;

    // coordinate as derived from the upload path, with the pom as fallback
    // for fields no versioned PUT recorded
    let coords = Coordinates {
        group: meta.group.clone().unwrap_or_else(|| pom.group.clone()),
        artifact: meta.name.clone().unwrap_or_else(|| pom.name.clone()),
        version: meta.version.clone().unwrap_or_else(|| pom.version.clone()),
    };
    let group_path = meta
        .group_path
        .clone()
        .unwrap_or_else(|| coordinates::group_path(&coords.group));

    // 3. parse the metadata file before anything is published
    let metadata_file = dir
        .join(&group_path)
        .join(&coords.artifact)
        .join("maven-metadata.xml");
    parse_maven_metadata(&metadata_file).await?;

    // 4. regenerate its checksums; client-sent ones were dropped at routing
    for algo in ChecksumAlgo::ALL {
        let digest = checksum::file_checksum(&metadata_file, algo).await?;
        fs::write(checksum::checksum_file(&metadata_file, algo), digest).await?;
    }

    // 5. full validation
    validate_deploy(
        dir,
        &pom,
        &coords,
        state.db.as_ref(),
        state.central.as_ref(),
        &state.config.central_allowlist,
    )
    .await?;

    // 6. group record, claiming on first use
    state
        .db
        .check_and_add_group(&identity.username, &coords.group)
        .await?;

    // 7. publish every staged file; each write is durable before the next
    let files = staging::list_files(dir).await?;
    for file in &files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == METADATA_FILE || name == FINALIZED_SENTINEL {
            continue;
        }
        let key = checksum::subpath(dir, file).ok_or_else(|| {
            DeployError::Internal(format!("staged file escapes staging dir: {}", file.display()))
        })?;
        let data = fs::read(file).await?;
        state
            .store
            .write_artifact(&key, &data)
            .await
            .map_err(|e| DeployError::Internal(format!("storage error: {}", e)))?;
    }

    // 8. record the release
    state.db.add_jar(&identity.username, &pom).await?;

    // 9. index for search in the background; failure never fails the deploy
    let at: DateTime<Utc> = fs::metadata(&pom_path)
        .await?
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let search = state.search.clone();
    let pom_for_index = pom.clone();
    tokio::spawn(async move {
        if let Err(e) = search.index(&pom_for_index, at).await {
            tracing::warn!(
                group = %pom_for_index.group,
                artifact = %pom_for_index.name,
                version = %pom_for_index.version,
                error = %e,
                "Search indexing failed"
            );
        }
    });

    // 10. sentinel: late files now stream straight to storage
    staging::mark_finalized(dir).await?;

    tracing::info!(
        group = %coords.group,
        artifact = %coords.artifact,
        version = %coords.version,
        username = %identity.username,
        dir = %dir.display(),
        "Deploy finalized"
    );
    Ok(())
}

//! Per-PUT orchestration: authorize, resolve the staging directory, persist
//! the file, and detect the finalization trigger.

use crate::auth::Identity;
use crate::deploy::finalize::finalize_deploy;
use crate::session::UploadSession;
use crate::staging::{self, StagingMetadata};
use crate::state::AppState;
use cask_core::checksum::{self, ChecksumAlgo};
use cask_core::coordinates::{group_from_path, is_snapshot_version, timestamp_version_of};
use cask_core::DeployError;
use std::path::Path;

/// Membership check: the account must belong to the group, or the group must
/// not yet exist (permitting claim at finalization).
async fn authorize_group(
    state: &AppState,
    identity: &Identity,
    group: &str,
) -> Result<(), DeployError> {
    let active = state.db.group_active_names(group).await?;
    if active.is_empty() || active.iter().any(|n| n == &identity.username) {
        return Ok(());
    }
    Err(DeployError::Forbidden(format!(
        "{} does not have access to the {} group",
        identity.username, group
    )))
}

/// Handle a PUT for `/<group>/<artifact>/<version>/<filename>`.
///
/// After the staging directory has been finalized, late-arriving files
/// (typically tail checksum sidecars) are streamed straight into the blob
/// store at their coordinate-relative path instead of re-finalizing.
pub async fn handle_versioned_upload(
    state: &AppState,
    identity: &Identity,
    session: &mut UploadSession,
    group_path: &str,
    artifact: &str,
    version: &str,
    filename: &str,
    body: &[u8],
) -> Result<(), DeployError> {
    let group = group_from_path(group_path);
    let timestamp_version = if is_snapshot_version(version) {
        timestamp_version_of(filename)
    } else {
        None
    };

    authorize_group(state, identity, &group).await?;
    identity.check_scope(&group, artifact)?;

    let dir = state
        .staging
        .find_upload_dir(
            &group,
            artifact,
            Some(version),
            timestamp_version.as_deref(),
            session,
        )
        .await?;

    staging::write_metadata(
        &dir,
        StagingMetadata {
            group: Some(group.clone()),
            group_path: Some(group_path.to_string()),
            name: Some(artifact.to_string()),
            version: Some(version.to_string()),
            timestamp_version,
        },
    )
    .await?;

    let relative = format!("{}/{}/{}/{}", group_path, artifact, version, filename);

    if staging::is_finalized(&dir).await {
        // tail file after finalization: re-authorize and write through
        authorize_group(state, identity, &group).await?;
        identity.check_scope(&group, artifact)?;
        state
            .store
            .write_artifact(&relative, body)
            .await
            .map_err(|e| DeployError::Internal(format!("storage error: {}", e)))?;
        tracing::info!(
            key = %relative,
            dir = %dir.display(),
            "File received after finalization, written through to storage"
        );
    } else {
        staging::save_file(&dir.join(&relative), body).await?;
    }

    session.promote(&dir);
    Ok(())
}

/// Handle a PUT for `/<group>/<artifact>/maven-metadata.xml` (non-snapshot
/// path shape). Finalizes the staging directory when the metadata file's
/// sha1 differs from the previously stored one and the directory has not
/// been finalized yet.
pub async fn handle_metadata_upload(
    state: &AppState,
    identity: &Identity,
    session: &mut UploadSession,
    group_path: &str,
    artifact: &str,
    body: &[u8],
) -> Result<bool, DeployError> {
    let group = group_from_path(group_path);

    authorize_group(state, identity, &group).await?;
    identity.check_scope(&group, artifact)?;

    let dir = state
        .staging
        .find_upload_dir(&group, artifact, None, None, session)
        .await?;

    staging::write_metadata(
        &dir,
        StagingMetadata {
            group: Some(group.clone()),
            group_path: Some(group_path.to_string()),
            name: Some(artifact.to_string()),
            version: None,
            timestamp_version: None,
        },
    )
    .await?;

    let dest = dir
        .join(group_path)
        .join(artifact)
        .join("maven-metadata.xml");
    let previous_sha1 = staged_metadata_sha1(&dest).await;
    staging::save_file(&dest, body).await?;
    session.promote(&dir);

    let new_sha1 = checksum::digest(body, ChecksumAlgo::Sha1);
    let changed = previous_sha1.as_deref() != Some(new_sha1.as_str());

    if changed && !staging::is_finalized(&dir).await {
        finalize_deploy(state, identity, &dir).await?;
        return Ok(true);
    }

    tracing::debug!(
        dir = %dir.display(),
        changed = changed,
        "Metadata write did not trigger finalization"
    );
    Ok(false)
}

/// Sha1 of the previously staged metadata file, if any. Maven clients bump
/// `lastUpdated` on every attempt, so a genuine new deploy always differs.
async fn staged_metadata_sha1(metadata_file: &Path) -> Option<String> {
    checksum::file_checksum(metadata_file, ChecksumAlgo::Sha1)
        .await
        .ok()
}

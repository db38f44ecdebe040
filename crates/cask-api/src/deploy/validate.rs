//! Deploy validation.
//!
//! Runs over a complete staging directory plus the parsed POM, in order,
//! failing on the first violation. Checks: GAV character rules, POM against
//! the upload path, non-snapshot redeploy, Central shadowing, jar presence,
//! checksum totality, and signature totality.

use crate::deploy::central::CentralLookup;
use crate::staging::{self, FINALIZED_SENTINEL, METADATA_FILE};
use cask_core::checksum::{self, ChecksumAlgo};
use cask_core::{Coordinates, DeployError, PomData};
use cask_db::MetadataDb;
use std::path::{Path, PathBuf};

pub async fn validate_deploy(
    dir: &Path,
    pom: &PomData,
    coords: &Coordinates,
    db: &dyn MetadataDb,
    central: &dyn CentralLookup,
    allowlist: &[(String, String)],
) -> Result<(), DeployError> {
    coords.validate()?;
    validate_pom_entries(pom, coords)?;
    validate_redeploy(coords, db).await?;
    validate_central_shadow(coords, central, allowlist).await?;

    let artifacts = staged_artifacts(dir).await?;
    validate_jar_presence(pom, coords, &artifacts)?;
    validate_checksums(&artifacts).await?;
    validate_signatures(&artifacts)?;
    Ok(())
}

/// Uploaded files only: everything in the directory except the sidecar
/// record and the finalized sentinel.
async fn staged_artifacts(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let files = staging::list_files(dir).await?;
    Ok(files
        .into_iter()
        .filter(|f| {
            let name = file_name(f);
            name != METADATA_FILE && name != FINALIZED_SENTINEL
        })
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_ext(path: &Path, ext: &str) -> bool {
    file_name(path).ends_with(ext)
}

fn is_checksum(path: &Path) -> bool {
    has_ext(path, ".md5") || has_ext(path, ".sha1")
}

fn validate_pom_entries(pom: &PomData, coords: &Coordinates) -> Result<(), DeployError> {
    let pairs = [
        ("group", &pom.group, &coords.group),
        ("name", &pom.name, &coords.artifact),
        ("version", &pom.version, &coords.version),
    ];
    for (field, in_pom, in_path) in pairs {
        if in_pom != in_path {
            return Err(DeployError::PomEntryMismatch(format!(
                "the {} in the pom ({}) does not match the {} you are deploying to ({})",
                field, in_pom, field, in_path
            )));
        }
    }
    Ok(())
}

async fn validate_redeploy(coords: &Coordinates, db: &dyn MetadataDb) -> Result<(), DeployError> {
    if coords.is_snapshot() {
        return Ok(());
    }
    if db
        .find_jar(&coords.group, &coords.artifact, &coords.version)
        .await?
        .is_some()
    {
        return Err(DeployError::NonSnapshotRedeploy(format!(
            "redeploying non-snapshot versions is not allowed ({}/{} {} already exists)",
            coords.group, coords.artifact, coords.version
        )));
    }
    Ok(())
}

async fn validate_central_shadow(
    coords: &Coordinates,
    central: &dyn CentralLookup,
    allowlist: &[(String, String)],
) -> Result<(), DeployError> {
    let allowed = allowlist
        .iter()
        .any(|(g, a)| g == &coords.group && a == &coords.artifact);
    if allowed {
        return Ok(());
    }
    match central.exists(&coords.group, &coords.artifact).await {
        Ok(true) => Err(DeployError::CentralShadow(format!(
            "{}/{} already exists on Maven Central, and shadowing it is not allowed",
            coords.group, coords.artifact
        ))),
        Ok(false) => Ok(()),
        Err(e) => {
            tracing::warn!(
                group = %coords.group,
                artifact = %coords.artifact,
                error = %e,
                "Maven Central probe failed"
            );
            Err(DeployError::CentralShadowCheckFailure(format!(
                "{}/{}",
                coords.group, coords.artifact
            )))
        }
    }
}

fn validate_jar_presence(
    pom: &PomData,
    coords: &Coordinates,
    artifacts: &[PathBuf],
) -> Result<(), DeployError> {
    if !pom.is_jar_packaging() {
        return Ok(());
    }
    if artifacts.iter().any(|f| has_ext(f, ".jar")) {
        return Ok(());
    }
    Err(DeployError::MissingJarFile(format!(
        "no jar file was uploaded for {}/{} {}",
        coords.group, coords.artifact, coords.version
    )))
}

/// Every artifact (checksum sidecars and signatures excepted) must carry at
/// least one of `.md5`/`.sha1`, and every provided sidecar must validate.
async fn validate_checksums(artifacts: &[PathBuf]) -> Result<(), DeployError> {
    for file in artifacts {
        if is_checksum(file) {
            continue;
        }
        let mut provided = 0;
        for algo in ChecksumAlgo::ALL {
            let sidecar = checksum::checksum_file(file, algo);
            if !artifacts.contains(&sidecar) {
                continue;
            }
            provided += 1;
            if !checksum::valid_checksum_file(file, algo).await? {
                return Err(DeployError::FileInvalidChecksum(file_name(file)));
            }
        }
        if provided == 0 && !has_ext(file, ".asc") {
            return Err(DeployError::FileMissingChecksum(file_name(file)));
        }
    }
    Ok(())
}

/// If any signature was staged, the deploy must be fully signed: every
/// non-signature artifact (maven-metadata.xml and checksums excepted) needs
/// its sibling `.asc`.
fn validate_signatures(artifacts: &[PathBuf]) -> Result<(), DeployError> {
    let signable: Vec<&PathBuf> = artifacts
        .iter()
        .filter(|f| !is_checksum(f) && !file_name(f).starts_with("maven-metadata.xml"))
        .collect();

    if !signable.iter().any(|f| has_ext(f, ".asc")) {
        return Ok(());
    }

    for file in &signable {
        if has_ext(file, ".asc") {
            continue;
        }
        let expected = PathBuf::from(format!("{}.asc", file.display()));
        if !signable.iter().any(|f| **f == expected) {
            return Err(DeployError::FileMissingSignature(file_name(file)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Coordinates {
        Coordinates::new("com.ex", "lib", "1.0")
    }

    fn pom() -> PomData {
        PomData {
            group: "com.ex".into(),
            name: "lib".into(),
            version: "1.0".into(),
            packaging: "jar".into(),
            description: None,
            url: None,
        }
    }

    #[test]
    fn test_pom_entry_mismatch_names_the_field() {
        let mut bad = pom();
        bad.version = "2.0".into();
        let err = validate_pom_entries(&bad, &coords()).unwrap_err();
        assert_eq!(err.tag(), "pom-entry-mismatch");
        assert!(err.to_string().contains("2.0"));
        assert!(err.to_string().contains("1.0"));
    }

    #[test]
    fn test_jar_presence_only_for_jar_packaging() {
        let artifacts = vec![PathBuf::from("/up/com/ex/lib/1.0/lib-1.0.pom")];
        let err = validate_jar_presence(&pom(), &coords(), &artifacts).unwrap_err();
        assert_eq!(err.tag(), "missing-jar-file");

        let mut pom_packaging = pom();
        pom_packaging.packaging = "pom".into();
        assert!(validate_jar_presence(&pom_packaging, &coords(), &artifacts).is_ok());
    }

    #[test]
    fn test_signature_totality() {
        let base = vec![
            PathBuf::from("/up/a/lib-1.0.jar"),
            PathBuf::from("/up/a/lib-1.0.pom"),
            PathBuf::from("/up/a/lib-1.0.jar.sha1"),
            PathBuf::from("/up/a/maven-metadata.xml"),
        ];
        // no signatures at all is fine
        assert!(validate_signatures(&base).is_ok());

        // one signature demands all
        let mut partial = base.clone();
        partial.push(PathBuf::from("/up/a/lib-1.0.jar.asc"));
        let err = validate_signatures(&partial).unwrap_err();
        assert_eq!(err.tag(), "file-missing-signature");
        assert!(err.to_string().contains("lib-1.0.pom"));

        let mut full = partial.clone();
        full.push(PathBuf::from("/up/a/lib-1.0.pom.asc"));
        assert!(validate_signatures(&full).is_ok());
    }

    #[test]
    fn test_metadata_is_exempt_from_signing() {
        let artifacts = vec![
            PathBuf::from("/up/a/lib-1.0.jar"),
            PathBuf::from("/up/a/lib-1.0.jar.asc"),
            PathBuf::from("/up/a/maven-metadata.xml"),
            PathBuf::from("/up/a/maven-metadata.xml.sha1"),
        ];
        assert!(validate_signatures(&artifacts).is_ok());
    }

    #[tokio::test]
    async fn test_checksum_totality() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib-1.0.jar");
        staging::save_file(&jar, b"jar bytes").await.unwrap();

        // no sidecar at all
        let artifacts = vec![jar.clone()];
        let err = validate_checksums(&artifacts).await.unwrap_err();
        assert_eq!(err.tag(), "file-missing-checksum");
        assert!(err.to_string().contains("lib-1.0.jar"));

        // wrong sidecar content
        let sha1 = checksum::checksum_file(&jar, ChecksumAlgo::Sha1);
        staging::save_file(&sha1, b"deadbeef").await.unwrap();
        let artifacts = vec![jar.clone(), sha1.clone()];
        let err = validate_checksums(&artifacts).await.unwrap_err();
        assert_eq!(err.tag(), "file-invalid-checksum");
        assert!(err.to_string().contains("lib-1.0.jar"));

        // correct sidecar
        let digest = checksum::file_checksum(&jar, ChecksumAlgo::Sha1).await.unwrap();
        staging::save_file(&sha1, digest.as_bytes()).await.unwrap();
        assert!(validate_checksums(&artifacts).await.is_ok());
    }
}

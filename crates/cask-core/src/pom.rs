//! POM descriptor and maven-metadata.xml parsing.
//!
//! Only the fields the deploy pipeline needs are extracted. Per Maven
//! semantics, a missing `groupId` or `version` is inherited from the
//! `<parent>` block, and packaging defaults to `jar`.

use crate::error::DeployError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Parsed POM data for one artifact version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PomData {
    pub group: String,
    pub name: String,
    pub version: String,
    pub packaging: String,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl PomData {
    pub fn is_jar_packaging(&self) -> bool {
        self.packaging == "jar"
    }
}

/// Versions listed by a `maven-metadata.xml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MavenMetadata {
    pub group: String,
    pub name: String,
    pub versions: Vec<String>,
}

#[derive(Default)]
struct RawPom {
    group: Option<String>,
    name: Option<String>,
    version: Option<String>,
    packaging: Option<String>,
    description: Option<String>,
    url: Option<String>,
    parent_group: Option<String>,
    parent_version: Option<String>,
}

fn parse_xml_fields(content: &str, collect: &mut dyn FnMut(&[String], String)) -> Result<(), String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?.into_owned();
                collect(&stack, text);
            }
            Ok(Event::Eof) => {
                if !stack.is_empty() {
                    return Err(format!("unclosed element {}", stack.join("/")));
                }
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(())
}

/// Parse a POM file into [PomData].
pub async fn parse_pom(path: &Path) -> Result<PomData, DeployError> {
    let invalid = || DeployError::InvalidPomFile(path.display().to_string());
    let content = fs::read_to_string(path).await.map_err(|_| invalid())?;
    pom_from_str(&content).ok_or_else(invalid)
}

/// Parse POM XML content. Returns `None` on malformed XML or when the
/// effective coordinate is incomplete.
pub fn pom_from_str(content: &str) -> Option<PomData> {
    let mut raw = RawPom::default();
    let result = parse_xml_fields(content, &mut |stack, text| {
        let path: Vec<&str> = stack.iter().map(|s| s.as_str()).collect();
        match path.as_slice() {
            ["project", "groupId"] => raw.group = Some(text),
            ["project", "artifactId"] => raw.name = Some(text),
            ["project", "version"] => raw.version = Some(text),
            ["project", "packaging"] => raw.packaging = Some(text),
            ["project", "description"] => raw.description = Some(text),
            ["project", "url"] => raw.url = Some(text),
            ["project", "parent", "groupId"] => raw.parent_group = Some(text),
            ["project", "parent", "version"] => raw.parent_version = Some(text),
            _ => {}
        }
    });
    result.ok()?;

    let group = raw.group.or(raw.parent_group)?;
    let name = raw.name?;
    let version = raw.version.or(raw.parent_version)?;
    Some(PomData {
        group,
        name,
        version,
        packaging: raw.packaging.unwrap_or_else(|| "jar".to_string()),
        description: raw.description,
        url: raw.url,
    })
}

/// Parse a `maven-metadata.xml` file. Sidecar checksums arrive after this
/// file, so corruption can slip past transport checks; parsing up front
/// surfaces it before publication.
pub async fn parse_maven_metadata(path: &Path) -> Result<MavenMetadata, DeployError> {
    let invalid = || DeployError::InvalidMavenMetadataFile(path.display().to_string());
    let content = fs::read_to_string(path).await.map_err(|_| invalid())?;
    metadata_from_str(&content).ok_or_else(invalid)
}

/// Parse maven-metadata XML content.
pub fn metadata_from_str(content: &str) -> Option<MavenMetadata> {
    let mut meta = MavenMetadata::default();
    let result = parse_xml_fields(content, &mut |stack, text| {
        let path: Vec<&str> = stack.iter().map(|s| s.as_str()).collect();
        match path.as_slice() {
            ["metadata", "groupId"] => meta.group = text,
            ["metadata", "artifactId"] => meta.name = text,
            ["metadata", "versioning", "versions", "version"] => meta.versions.push(text),
            _ => {}
        }
    });
    result.ok()?;
    if meta.group.is_empty() && meta.name.is_empty() {
        return None;
    }
    Some(meta)
}

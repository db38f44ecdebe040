//! PUT routing surface and GET fallthrough.
//!
//! Maven encodes everything into the path, and the group may span any number
//! of segments, so requests arrive on a single wildcard route and are
//! pattern-matched here.

use crate::auth::Identity;
use crate::deploy::upload::{handle_metadata_upload, handle_versioned_upload};
use crate::error::HttpDeployError;
use crate::middleware::RequestId;
use crate::state::AppState;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use cask_core::coordinates::{is_snapshot_version, is_version_string};
use cask_core::DeployError;
use std::sync::Arc;

const ARTIFACT_EXTENSIONS: [&str; 5] = [".pom", ".jar", ".sha1", ".md5", ".asc"];

#[derive(Debug, PartialEq)]
enum Route {
    /// `/<group>/<artifact>/<version>/<filename>`
    Versioned {
        group_path: String,
        artifact: String,
        version: String,
        filename: String,
    },
    /// `/<group>/<artifact>/maven-metadata.xml`
    Metadata {
        group_path: String,
        artifact: String,
    },
    /// `/<group>/<artifact>/maven-metadata.xml.{md5,sha1}` - accepted and
    /// dropped; the server regenerates these at finalization.
    MetadataChecksum,
}

fn parse_route(path: &str) -> Option<Route> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let n = segments.len();
    let last = *segments.last()?;

    if last == "maven-metadata.xml"
        || last == "maven-metadata.xml.md5"
        || last == "maven-metadata.xml.sha1"
    {
        if n < 3 {
            return None;
        }
        let penultimate = segments[n - 2];
        if is_snapshot_version(penultimate) && is_version_string(penultimate) {
            // snapshot metadata lives in the version directory and is
            // treated as a plain versioned upload
            if n < 4 {
                return None;
            }
            return Some(Route::Versioned {
                group_path: segments[..n - 3].join("/"),
                artifact: segments[n - 3].to_string(),
                version: penultimate.to_string(),
                filename: last.to_string(),
            });
        }
        if last == "maven-metadata.xml" {
            return Some(Route::Metadata {
                group_path: segments[..n - 2].join("/"),
                artifact: penultimate.to_string(),
            });
        }
        return Some(Route::MetadataChecksum);
    }

    if ARTIFACT_EXTENSIONS.iter().any(|ext| last.ends_with(ext)) {
        if n < 4 {
            return None;
        }
        let group_segments = &segments[..n - 3];
        // wire groups are slash-encoded; a dotted segment is not a group
        if group_segments.iter().any(|s| s.contains('.')) {
            return None;
        }
        return Some(Route::Versioned {
            group_path: group_segments.join("/"),
            artifact: segments[n - 3].to_string(),
            version: segments[n - 2].to_string(),
            filename: last.to_string(),
        });
    }

    None
}

pub async fn handle_put(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let trace_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let identity = request.extensions().get::<Identity>().cloned();
    let username = identity.as_ref().map(|id| id.username.clone());
    let headers = request.headers().clone();
    let uri = format!("/{}", path);

    let body: Bytes = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(trace_id = %trace_id, uri = %uri, error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    match dispatch_put(&state, identity, &headers, &path, &body).await {
        Ok(response) => response,
        Err(error) => {
            if error.is_validation() {
                tracing::warn!(
                    trace_id = %trace_id,
                    uri = %uri,
                    username = username.as_deref().unwrap_or("-"),
                    tag = error.tag(),
                    error = %error,
                    "Deploy rejected"
                );
            } else {
                state.reporter.report(&error, &uri, &trace_id);
            }
            HttpDeployError(error).into_response()
        }
    }
}

async fn dispatch_put(
    state: &AppState,
    identity: Option<Identity>,
    headers: &HeaderMap,
    path: &str,
    body: &[u8],
) -> Result<Response, DeployError> {
    let Some(route) = parse_route(path) else {
        return Ok((StatusCode::BAD_REQUEST, "Bad Request").into_response());
    };

    if route == Route::MetadataChecksum {
        return Ok(StatusCode::CREATED.into_response());
    }

    let identity = identity.ok_or_else(|| {
        DeployError::Forbidden("authentication required to deploy".to_string())
    })?;

    let mut session = state.sessions.from_headers(headers);

    match route {
        Route::Versioned {
            group_path,
            artifact,
            version,
            filename,
        } => {
            handle_versioned_upload(
                state,
                &identity,
                &mut session,
                &group_path,
                &artifact,
                &version,
                &filename,
                body,
            )
            .await?;
        }
        Route::Metadata {
            group_path,
            artifact,
        } => {
            handle_metadata_upload(state, &identity, &mut session, &group_path, &artifact, body)
                .await?;
        }
        Route::MetadataChecksum => unreachable!("handled above"),
    }

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, state.sessions.set_cookie_value(&session))],
    )
        .into_response())
}

/// GET fallthrough: serve the file from the local repository when present.
pub async fn handle_get_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Response {
    let file = state.config.repo_path.join(path.trim_start_matches('/'));
    match tokio::fs::read(&file).await {
        Ok(data) => (
            [(axum::http::header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versioned_route() {
        let route = parse_route("com/ex/lib/1.0/lib-1.0.jar").unwrap();
        assert_eq!(
            route,
            Route::Versioned {
                group_path: "com/ex".into(),
                artifact: "lib".into(),
                version: "1.0".into(),
                filename: "lib-1.0.jar".into(),
            }
        );
        assert!(matches!(
            parse_route("com/ex/lib/1.0/lib-1.0.pom.asc"),
            Some(Route::Versioned { .. })
        ));
    }

    #[test]
    fn test_parse_metadata_route() {
        let route = parse_route("com/ex/lib/maven-metadata.xml").unwrap();
        assert_eq!(
            route,
            Route::Metadata {
                group_path: "com/ex".into(),
                artifact: "lib".into(),
            }
        );
    }

    #[test]
    fn test_metadata_checksum_is_dropped() {
        assert_eq!(
            parse_route("com/ex/lib/maven-metadata.xml.sha1"),
            Some(Route::MetadataChecksum)
        );
        assert_eq!(
            parse_route("com/ex/lib/maven-metadata.xml.md5"),
            Some(Route::MetadataChecksum)
        );
    }

    #[test]
    fn test_snapshot_metadata_is_versioned_upload() {
        let route = parse_route("com/ex/lib/1.0-SNAPSHOT/maven-metadata.xml").unwrap();
        assert_eq!(
            route,
            Route::Versioned {
                group_path: "com/ex".into(),
                artifact: "lib".into(),
                version: "1.0-SNAPSHOT".into(),
                filename: "maven-metadata.xml".into(),
            }
        );
    }

    #[test]
    fn test_dotted_group_segment_is_rejected() {
        assert_eq!(parse_route("com.ex/lib/1.0/lib-1.0.jar"), None);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert_eq!(parse_route("com/ex/lib/1.0/lib-1.0.war"), None);
        assert_eq!(parse_route("com/ex/lib/1.0"), None);
        assert_eq!(parse_route(""), None);
    }

    #[test]
    fn test_short_paths_are_rejected() {
        assert_eq!(parse_route("lib-1.0.jar"), None);
        assert_eq!(parse_route("lib/maven-metadata.xml"), None);
    }
}

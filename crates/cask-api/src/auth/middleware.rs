//! Deploy credential middleware.
//!
//! The deploy surface accepts only deploy tokens, carried as the password of
//! an HTTP Basic pair. Password credentials are audit-logged and rejected
//! with 401; requests with no credentials proceed unauthenticated and are
//! rejected by the upload handlers.

use crate::auth::models::Identity;
use crate::auth::token;
use crate::error::HttpDeployError;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cask_core::DeployError;
use std::sync::Arc;

/// Decode a Basic authorization header into `(username, password)`.
fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn require_deploy_token(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string());

    let Some(header) = header else {
        return next.run(request).await;
    };

    let trace_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let Some((username, password)) = parse_basic(&header) else {
        // Non-Basic schemes carry no deploy credential; proceed and let the
        // upload handlers reject the write.
        return next.run(request).await;
    };

    if !token::is_token(&password) {
        tracing::warn!(
            trace_id = %trace_id,
            username = %username,
            uri = %request.uri(),
            tag = "deploy-password-rejection",
            "Password credentials rejected on deploy route"
        );
        return HttpDeployError(DeployError::PasswordRejection(
            "a deploy token is required to deploy".to_string(),
        ))
        .into_response();
    }

    match authenticate_token(&state, &username, &password).await {
        Ok(identity) => {
            if let Some(token) = &identity.token {
                let db = state.db.clone();
                let token_id = token.id;
                tokio::spawn(async move {
                    let _ = db.update_token_last_used(token_id).await;
                });
            }
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                trace_id = %trace_id,
                username = %username,
                uri = %request.uri(),
                tag = %e.tag(),
                "Deploy token rejected"
            );
            HttpDeployError(e).into_response()
        }
    }
}

async fn authenticate_token(
    state: &AppState,
    username: &str,
    raw_token: &str,
) -> Result<Identity, DeployError> {
    let prefix = token::token_prefix(raw_token);
    let candidates = state.db.find_tokens_by_prefix(&prefix).await?;

    for candidate in candidates {
        if candidate.disabled || candidate.username != username {
            continue;
        }
        if token::verify_token(raw_token, &candidate.token_hash) {
            return Ok(Identity::from_token(candidate));
        }
    }

    Err(DeployError::Forbidden("invalid deploy token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let header = format!("Basic {}", STANDARD.encode("alice:ct_abc123"));
        assert_eq!(
            parse_basic(&header),
            Some(("alice".to_string(), "ct_abc123".to_string()))
        );
        assert_eq!(parse_basic("Bearer xyz"), None);
        assert_eq!(parse_basic("Basic %%%"), None);
    }

    #[test]
    fn test_parse_basic_password_with_colon() {
        let header = format!("Basic {}", STANDARD.encode("alice:pa:ss"));
        assert_eq!(
            parse_basic(&header),
            Some(("alice".to_string(), "pa:ss".to_string()))
        );
    }
}

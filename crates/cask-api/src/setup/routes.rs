//! Route configuration and setup.

use crate::auth::middleware::require_deploy_token;
use crate::handlers;
use crate::middleware::{reject_dotdot, request_id_middleware};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::{routing::put, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the deploy router. Requests flow through (outermost first): body
/// limit, trace, request id, `..` rejection, token enforcement, dispatch.
pub fn build_router(state: Arc<AppState>) -> Router<()> {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route(
            "/{*path}",
            put(handlers::handle_put).get(handlers::handle_get_file),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .method_not_allowed_fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_deploy_token,
        ))
        .layer(axum::middleware::from_fn(reject_dotdot))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

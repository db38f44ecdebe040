//! HTTP error response conversion
//!
//! Maven clients surface the `status-message` response header to the user,
//! so deploy failures render as: status code from the error, a
//! `status-message` header carrying a short prefixed message, and the bare
//! message as the body.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use cask_core::{DeployError, LogLevel};

/// Wrapper type for DeployError to implement IntoResponse
/// (orphan rule: IntoResponse is external, DeployError lives in cask-core).
#[derive(Debug)]
pub struct HttpDeployError(pub DeployError);

impl From<DeployError> for HttpDeployError {
    fn from(err: DeployError) -> Self {
        HttpDeployError(err)
    }
}

fn log_error(error: &DeployError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, tag = error.tag(), "Deploy error");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, tag = error.tag(), "Deploy error");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, tag = error.tag(), "Deploy error");
        }
    }
}

impl IntoResponse for HttpDeployError {
    fn into_response(self) -> Response {
        let error = &self.0;

        log_error(error);

        let status =
            StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let status_message = HeaderValue::from_str(&error.status_message())
            .unwrap_or_else(|_| HeaderValue::from_static("Forbidden"));

        let mut response = (status, error.to_string()).into_response();
        response
            .headers_mut()
            .insert("status-message", status_message);
        response
    }
}

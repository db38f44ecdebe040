//! Error reporting sink for unexpected (non-validation) deploy failures.

use cask_core::DeployError;

pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &DeployError, uri: &str, trace_id: &str);
}

/// Default reporter: structured error log keyed by trace id.
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &DeployError, uri: &str, trace_id: &str) {
        tracing::error!(
            trace_id = %trace_id,
            uri = %uri,
            tag = error.tag(),
            error = %error,
            "Unexpected deploy failure"
        );
    }
}

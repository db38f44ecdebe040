//! HTTP deploy surface of the cask artifact repository.
//!
//! Maven-style clients upload a release as a sequence of PUTs; the pipeline
//! stitches them into one staging directory, validates the aggregate when
//! the `maven-metadata.xml` trigger arrives, and atomically publishes the
//! set to storage, the metadata database, and the search index.

pub mod auth;
pub mod deploy;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod reporter;
pub mod search;
pub mod session;
pub mod setup;
pub mod staging;
pub mod state;
pub mod telemetry;

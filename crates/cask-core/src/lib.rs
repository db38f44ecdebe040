//! Cask Core Library
//!
//! Core domain types shared across the cask artifact repository: Maven
//! coordinates, POM parsing, checksum utilities, error types, and
//! configuration.

pub mod checksum;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod models;
pub mod pom;

// Re-export commonly used types
pub use config::Config;
pub use coordinates::Coordinates;
pub use error::{DeployError, LogLevel};
pub use models::{DeployToken, JarRecord};
pub use pom::{MavenMetadata, PomData};

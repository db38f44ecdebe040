//! Database repositories for the data access layer.
//!
//! Each repository owns one table and provides the queries the deploy
//! pipeline consumes. [crate::PgMetadataDb] aggregates them behind the
//! [crate::MetadataDb] trait.

pub mod groups;
pub mod jars;
pub mod tokens;

pub use groups::GroupRepository;
pub use jars::JarRepository;
pub use tokens::TokenRepository;

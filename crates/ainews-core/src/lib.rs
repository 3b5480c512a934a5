//! Shared domain types for the AI news ingest pipeline.
//!
//! Holds the environment-driven [`AppConfig`], the canonical record shapes
//! persisted by every source, the keyword [`RelevanceClassifier`], and the
//! store traits that the Postgres and in-memory backends implement.

mod app_config;
mod config;
pub mod memory;
pub mod records;
pub mod relevance;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use memory::MemoryStore;
pub use records::{Article, CanonicalRecord, DiscussionPost, SourceKind, WatermarkKey};
pub use relevance::RelevanceClassifier;
pub use store::{IngestStore, RecordSink, StoreConnector, StoreError, WatermarkStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("relevance classifier needs at least one keyword")]
    NoKeywords,

    #[error("invalid keyword pattern {keyword:?}: {source}")]
    InvalidKeyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown source kind: {0}")]
    UnknownSource(String),
}

//! Persistence seams shared by every source adapter.
//!
//! The pipeline only talks to these traits; `ainews-db` provides the Postgres
//! backend and [`crate::MemoryStore`] the in-process one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::records::{CanonicalRecord, WatermarkKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Per-source (or per-community) incremental fetch cursor.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Timestamp of the newest persisted item for `key`, or `None` if no
    /// cycle has completed for it yet.
    async fn get(&self, key: &WatermarkKey) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Create or overwrite the cursor for `key`. Does not enforce ordering.
    async fn set(&self, key: &WatermarkKey, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Idempotent persistence keyed by the record's natural key.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Insert `record`, or replace every field of the existing row with the
    /// same natural key.
    async fn upsert(&self, record: &CanonicalRecord) -> Result<(), StoreError>;
}

/// Everything a source adapter needs from the store during one cycle.
pub trait IngestStore: WatermarkStore + RecordSink {}

impl<T: WatermarkStore + RecordSink> IngestStore for T {}

/// Scoped acquisition of a store handle for one job invocation.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: IngestStore;

    /// Open a handle. Called once per job.
    async fn connect(&self) -> Result<Self::Store, StoreError>;

    /// Release a handle obtained from [`StoreConnector::connect`].
    async fn disconnect(&self, store: Self::Store);
}

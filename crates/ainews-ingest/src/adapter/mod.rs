//! Source adapters: bounded retrieval driving watermark → fetch → filter →
//! normalize → upsert → watermark for one source.

mod aggregated;
mod discussion;
mod wire;

use std::collections::HashSet;

use ainews_core::{IngestStore, RelevanceClassifier, SourceKind, WatermarkKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::IngestError;
use crate::extract::FullTextExtractor;
use crate::normalize::normalize;
use crate::types::{Candidate, FetchParams, FetchReport};

pub use aggregated::{GoogleNewsAdapter, MAX_TOPIC_REQUESTS};
pub use discussion::RedditAdapter;
pub use wire::NewsApiAdapter;

/// One fetch cycle for one source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> SourceKind;

    /// Run one cycle against `store`.
    ///
    /// Vendor, normalization and write failures are counted in the report;
    /// only unusable parameters or configuration are returned as errors.
    async fn fetch(
        &self,
        store: &dyn IngestStore,
        params: &FetchParams,
    ) -> Result<FetchReport, IngestError>;
}

/// Per-watermark-key state for one cycle.
///
/// Owns the incremental floor, the in-cycle dedup set and the newest
/// persisted timestamp. The stored watermark is always read, even in full
/// mode, so [`KeyCycle::close`] can never move it backwards.
pub(crate) struct KeyCycle {
    key: WatermarkKey,
    stored: Option<DateTime<Utc>>,
    floor: Option<DateTime<Utc>>,
    newest: Option<DateTime<Utc>>,
    seen: HashSet<String>,
    examined: usize,
    persisted: usize,
    request_failed: bool,
    report: FetchReport,
}

/// What a cycle needs besides the store: classifier for discussion sources,
/// extractor for article sources.
pub(crate) struct Stages<'a> {
    pub classifier: Option<&'a RelevanceClassifier>,
    pub extractor: &'a dyn FullTextExtractor,
}

impl KeyCycle {
    /// Read the key's watermark. `None` if the read failed, in which case the
    /// key is skipped for this cycle.
    pub(crate) async fn open(
        store: &dyn IngestStore,
        key: WatermarkKey,
        incremental: bool,
    ) -> Option<Self> {
        let stored = match store.get(&key).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(%key, error = %e, "watermark read failed, skipping key");
                return None;
            }
        };

        tracing::debug!(
            %key,
            watermark = ?stored,
            incremental,
            "starting key cycle"
        );

        Some(Self {
            key,
            stored,
            floor: if incremental { stored } else { None },
            newest: None,
            seen: HashSet::new(),
            examined: 0,
            persisted: 0,
            request_failed: false,
            report: FetchReport::default(),
        })
    }

    /// Lower bound handed to vendors that can filter server-side.
    pub(crate) fn floor(&self) -> Option<DateTime<Utc>> {
        self.floor
    }

    /// Whether `limit` candidates were examined or persisted.
    pub(crate) fn is_full(&self, limit: usize) -> bool {
        self.examined >= limit || self.persisted >= limit
    }

    pub(crate) fn remaining(&self, limit: usize) -> usize {
        limit.saturating_sub(self.examined)
    }

    /// A vendor request for this key failed; unread pages may hold items
    /// older than anything persisted so far, so the watermark must hold.
    pub(crate) fn request_failed(&mut self, error: &IngestError) {
        tracing::warn!(key = %self.key, error = %error, "vendor request failed");
        self.request_failed = true;
        self.report.failed_requests += 1;
    }

    /// Push one candidate through dedup, staleness, relevance, normalization
    /// and upsert.
    pub(crate) async fn ingest(
        &mut self,
        store: &dyn IngestStore,
        stages: &Stages<'_>,
        candidate: &Candidate,
    ) {
        if let Some(natural_key) = candidate.natural_key() {
            if !self.seen.insert(natural_key) {
                self.report.duplicate += 1;
                return;
            }
        }
        self.examined += 1;

        let timestamp = candidate.timestamp();
        if let (Some(floor), Some(at)) = (self.floor, timestamp) {
            if at <= floor {
                self.report.stale += 1;
                return;
            }
        }

        if let Some(classifier) = stages.classifier {
            if !classifier.is_relevant(&candidate.relevance_text()) {
                self.report.irrelevant += 1;
                return;
            }
        }

        let record = match normalize(candidate, stages.extractor, Utc::now()).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "skipping malformed candidate");
                self.report.malformed += 1;
                return;
            }
        };

        if let Err(e) = store.upsert(&record).await {
            tracing::warn!(
                key = %self.key,
                natural_key = record.natural_key(),
                error = %e,
                "upsert failed"
            );
            self.report.failed_writes += 1;
            return;
        }

        tracing::debug!(
            key = %self.key,
            natural_key = record.natural_key(),
            "persisted record"
        );
        self.persisted += 1;
        self.report.persisted += 1;
        if let Some(at) = timestamp {
            self.newest = Some(self.newest.map_or(at, |newest| newest.max(at)));
        }
    }

    /// Advance the watermark if this cycle persisted something newer and
    /// every vendor request succeeded. Returns the cycle's counters.
    pub(crate) async fn close(self, store: &dyn IngestStore) -> FetchReport {
        let advance = match (self.newest, self.stored) {
            (Some(newest), Some(stored)) => (newest > stored).then_some(newest),
            (newest, None) => newest,
            (None, Some(_)) => None,
        };

        match advance {
            Some(_) if self.request_failed => {
                tracing::warn!(
                    key = %self.key,
                    "watermark held back after failed vendor request"
                );
            }
            Some(at) => match store.set(&self.key, at).await {
                Ok(()) => tracing::info!(key = %self.key, watermark = %at, "watermark advanced"),
                Err(e) => tracing::warn!(key = %self.key, error = %e, "watermark write failed"),
            },
            None => {}
        }

        tracing::info!(key = %self.key, report = %self.report, "key cycle finished");
        self.report
    }
}

#[cfg(test)]
mod tests {
    use ainews_core::MemoryStore;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::extract::NoExtraction;
    use crate::types::NewsApiArticle;

    fn article(url: &str, at: DateTime<Utc>) -> Candidate {
        Candidate::NewsApi(NewsApiArticle {
            url: Some(url.to_string()),
            title: Some("t".to_string()),
            published_at: Some(at.to_rfc3339()),
            ..NewsApiArticle::default()
        })
    }

    fn stages() -> Stages<'static> {
        Stages {
            classifier: None,
            extractor: &NoExtraction,
        }
    }

    #[tokio::test]
    async fn full_mode_never_regresses_the_watermark() {
        let store = MemoryStore::new();
        let key = WatermarkKey::source(SourceKind::NewsApi);
        let stored = Utc.with_ymd_and_hms(2024, 11, 13, 0, 0, 0).unwrap();
        store.set_watermark(key.clone(), stored);

        let mut cycle = KeyCycle::open(&store, key.clone(), false).await.unwrap();
        let old = article("https://example.com/old", stored - Duration::days(1));
        cycle.ingest(&store, &stages(), &old).await;
        let report = cycle.close(&store).await;

        assert_eq!(report.persisted, 1);
        assert_eq!(store.watermark(&key), Some(stored));
    }

    #[tokio::test]
    async fn failed_request_holds_the_watermark() {
        let store = MemoryStore::new();
        let key = WatermarkKey::source(SourceKind::NewsApi);
        let at = Utc.with_ymd_and_hms(2024, 11, 13, 0, 0, 0).unwrap();

        let mut cycle = KeyCycle::open(&store, key.clone(), true).await.unwrap();
        cycle.ingest(&store, &stages(), &article("https://example.com/a", at)).await;
        cycle.request_failed(&IngestError::api("NewsAPI", "rateLimited"));
        let report = cycle.close(&store).await;

        assert_eq!(report.persisted, 1);
        assert_eq!(report.failed_requests, 1);
        assert_eq!(store.watermark(&key), None);
    }

    #[tokio::test]
    async fn duplicates_do_not_count_towards_the_limit() {
        let store = MemoryStore::new();
        let key = WatermarkKey::source(SourceKind::NewsApi);
        let at = Utc.with_ymd_and_hms(2024, 11, 13, 0, 0, 0).unwrap();

        let mut cycle = KeyCycle::open(&store, key, true).await.unwrap();
        let candidate = article("https://example.com/a", at);
        cycle.ingest(&store, &stages(), &candidate).await;
        cycle.ingest(&store, &stages(), &candidate).await;

        assert!(!cycle.is_full(2));
        assert_eq!(cycle.remaining(2), 1);
        let report = cycle.close(&store).await;
        assert_eq!(report.duplicate, 1);
        assert_eq!(store.upsert_calls(), 1);
    }
}

use ainews_core::{IngestStore, SourceKind, WatermarkKey};
use async_trait::async_trait;

use super::{KeyCycle, SourceAdapter, Stages};
use crate::error::IngestError;
use crate::extract::FullTextExtractor;
use crate::sources::AggregatorFeed;
use crate::types::{Candidate, FetchParams, FetchReport};

/// Request budget per cycle (the vendor's free-tier allowance).
pub const MAX_TOPIC_REQUESTS: usize = 100;

/// Google News adapter: one search per topic, one source-wide watermark.
///
/// A failed topic is counted and the next topic is tried.
pub struct GoogleNewsAdapter<F, E> {
    feed: F,
    extractor: E,
    topics: Vec<String>,
    max_results: usize,
}

impl<F: AggregatorFeed, E: FullTextExtractor> GoogleNewsAdapter<F, E> {
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidParams`] if `topics` is empty or
    /// `max_results` is zero.
    pub fn new(
        feed: F,
        extractor: E,
        topics: Vec<String>,
        max_results: usize,
    ) -> Result<Self, IngestError> {
        if topics.is_empty() {
            return Err(IngestError::InvalidParams(
                "at least one Google News topic is required".to_string(),
            ));
        }
        if max_results == 0 {
            return Err(IngestError::InvalidParams(
                "max_results must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            feed,
            extractor,
            topics,
            max_results,
        })
    }
}

#[async_trait]
impl<F: AggregatorFeed, E: FullTextExtractor> SourceAdapter for GoogleNewsAdapter<F, E> {
    fn source(&self) -> SourceKind {
        SourceKind::GoogleNews
    }

    async fn fetch(
        &self,
        store: &dyn IngestStore,
        params: &FetchParams,
    ) -> Result<FetchReport, IngestError> {
        params.validate()?;

        let key = WatermarkKey::source(SourceKind::GoogleNews);
        let Some(mut cycle) = KeyCycle::open(store, key, params.incremental).await else {
            return Ok(FetchReport::default());
        };
        let stages = Stages {
            classifier: None,
            extractor: &self.extractor,
        };

        for topic in self.topics.iter().take(MAX_TOPIC_REQUESTS) {
            if cycle.is_full(params.limit) {
                break;
            }

            let items = match self.feed.search(topic, self.max_results).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::debug!(topic = %topic, "topic failed, trying next");
                    cycle.request_failed(&e);
                    continue;
                }
            };

            for item in items {
                if cycle.is_full(params.limit) {
                    break;
                }
                cycle.ingest(store, &stages, &Candidate::GoogleNews(item)).await;
            }
        }

        Ok(cycle.close(store).await)
    }
}

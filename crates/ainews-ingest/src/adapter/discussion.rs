use ainews_core::{IngestStore, RelevanceClassifier, SourceKind, WatermarkKey};
use async_trait::async_trait;

use super::{KeyCycle, SourceAdapter, Stages};
use crate::error::IngestError;
use crate::extract::NoExtraction;
use crate::sources::reddit::MAX_PAGE_SIZE;
use crate::sources::DiscussionFeed;
use crate::types::{Candidate, FetchParams, FetchReport, ListingKind};

/// Reddit adapter: one watermark per subreddit, relevance-filtered.
///
/// `limit` applies to each subreddit separately. A failed page stops that
/// subreddit only; the remaining subreddits are still fetched.
pub struct RedditAdapter<F> {
    feed: F,
    communities: Vec<String>,
    listing: ListingKind,
    classifier: RelevanceClassifier,
}

impl<F: DiscussionFeed> RedditAdapter<F> {
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidParams`] if `communities` is empty.
    pub fn new(
        feed: F,
        communities: Vec<String>,
        listing: ListingKind,
        classifier: RelevanceClassifier,
    ) -> Result<Self, IngestError> {
        if communities.is_empty() {
            return Err(IngestError::InvalidParams(
                "at least one subreddit is required".to_string(),
            ));
        }
        Ok(Self {
            feed,
            communities,
            listing,
            classifier,
        })
    }

    async fn fetch_community(
        &self,
        store: &dyn IngestStore,
        community: &str,
        params: &FetchParams,
    ) -> Option<FetchReport> {
        let key = WatermarkKey::community(SourceKind::Reddit, community);
        let mut cycle = KeyCycle::open(store, key, params.incremental).await?;
        let stages = Stages {
            classifier: Some(&self.classifier),
            extractor: &NoExtraction,
        };

        let mut after: Option<String> = None;
        while !cycle.is_full(params.limit) {
            let want = cycle.remaining(params.limit).min(MAX_PAGE_SIZE);
            let page = match self
                .feed
                .listing(community, self.listing, want, after.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    cycle.request_failed(&e);
                    break;
                }
            };

            if page.posts.is_empty() {
                break;
            }

            for post in page.posts {
                if cycle.is_full(params.limit) {
                    break;
                }
                cycle.ingest(store, &stages, &Candidate::Reddit(post)).await;
            }

            after = page.after;
            if after.is_none() {
                break;
            }
        }

        Some(cycle.close(store).await)
    }
}

#[async_trait]
impl<F: DiscussionFeed> SourceAdapter for RedditAdapter<F> {
    fn source(&self) -> SourceKind {
        SourceKind::Reddit
    }

    async fn fetch(
        &self,
        store: &dyn IngestStore,
        params: &FetchParams,
    ) -> Result<FetchReport, IngestError> {
        params.validate()?;

        let mut report = FetchReport::default();
        for community in &self.communities {
            if let Some(community_report) = self.fetch_community(store, community, params).await {
                report.merge(community_report);
            }
        }

        tracing::info!(
            listing = %self.listing,
            communities = self.communities.len(),
            %report,
            "Reddit fetch finished"
        );
        Ok(report)
    }
}

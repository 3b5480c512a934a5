use ainews_core::{IngestStore, SourceKind, WatermarkKey};
use async_trait::async_trait;

use super::{KeyCycle, SourceAdapter, Stages};
use crate::error::IngestError;
use crate::extract::FullTextExtractor;
use crate::sources::newsapi::MAX_PAGE_SIZE;
use crate::sources::WireFeed;
use crate::types::{Candidate, FetchParams, FetchReport, WireQuery};

/// NewsAPI adapter: one source-wide watermark, keyword filtering happens in
/// the vendor query.
pub struct NewsApiAdapter<F, E> {
    feed: F,
    extractor: E,
    query: String,
}

impl<F: WireFeed, E: FullTextExtractor> NewsApiAdapter<F, E> {
    pub fn new(feed: F, extractor: E, query: impl Into<String>) -> Self {
        Self {
            feed,
            extractor,
            query: query.into(),
        }
    }
}

/// `(page_size, pages)` for a cycle: pages of `min(page_size, limit, 100)`,
/// enough of them to cover `limit`.
fn paging(params: &FetchParams) -> (usize, usize) {
    let page_size = params.page_size.min(params.limit).min(MAX_PAGE_SIZE);
    (page_size, params.limit.div_ceil(page_size))
}

#[async_trait]
impl<F: WireFeed, E: FullTextExtractor> SourceAdapter for NewsApiAdapter<F, E> {
    fn source(&self) -> SourceKind {
        SourceKind::NewsApi
    }

    async fn fetch(
        &self,
        store: &dyn IngestStore,
        params: &FetchParams,
    ) -> Result<FetchReport, IngestError> {
        params.validate()?;
        if self.query.trim().is_empty() {
            return Err(IngestError::InvalidParams(
                "NewsAPI query must not be empty".to_string(),
            ));
        }

        let key = WatermarkKey::source(SourceKind::NewsApi);
        let Some(mut cycle) = KeyCycle::open(store, key, params.incremental).await else {
            return Ok(FetchReport::default());
        };
        let stages = Stages {
            classifier: None,
            extractor: &self.extractor,
        };

        let (page_size, pages) = paging(params);
        for page in 1..=pages {
            if cycle.is_full(params.limit) {
                break;
            }

            let query = WireQuery {
                query: self.query.clone(),
                page,
                page_size,
                from: cycle.floor(),
            };
            let articles = match self.feed.everything(&query).await {
                Ok(articles) => articles,
                Err(e) => {
                    cycle.request_failed(&e);
                    break;
                }
            };

            if articles.is_empty() {
                break;
            }

            for article in articles {
                if cycle.is_full(params.limit) {
                    break;
                }
                cycle.ingest(store, &stages, &Candidate::NewsApi(article)).await;
            }
        }

        Ok(cycle.close(store).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_caps_page_size_and_covers_limit() {
        assert_eq!(paging(&FetchParams::new(100, true)), (100, 1));
        assert_eq!(paging(&FetchParams::new(250, true)), (100, 3));
        assert_eq!(paging(&FetchParams::new(30, true)), (30, 1));
        assert_eq!(
            paging(&FetchParams::new(45, true).with_page_size(20)),
            (20, 3)
        );
    }
}

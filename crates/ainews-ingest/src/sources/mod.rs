//! Vendor query collaborators.
//!
//! Each adapter talks to its vendor through one of the traits below, so tests
//! can script pages without a network. The `reqwest` clients in the submodules
//! are the production implementations.

pub mod gnews;
pub mod newsapi;
pub mod reddit;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::IngestError;
use crate::types::{GoogleNewsItem, ListingKind, ListingPage, NewsApiArticle, WireQuery};

pub use gnews::GoogleNewsClient;
pub use newsapi::NewsApiClient;
pub use reddit::{RedditClient, RedditCredentials};

/// Subreddit listings.
#[async_trait]
pub trait DiscussionFeed: Send + Sync {
    /// One page of `community`'s `kind` listing, at most `limit` posts,
    /// continuing from `after`. An empty page means the listing is exhausted.
    async fn listing(
        &self,
        community: &str,
        kind: ListingKind,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingPage, IngestError>;
}

/// NewsAPI-style keyword search over wire articles.
#[async_trait]
pub trait WireFeed: Send + Sync {
    async fn everything(&self, query: &WireQuery) -> Result<Vec<NewsApiArticle>, IngestError>;
}

/// Per-topic news aggregation search.
#[async_trait]
pub trait AggregatorFeed: Send + Sync {
    /// At most `max_results` items for `topic`.
    async fn search(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<Vec<GoogleNewsItem>, IngestError>;
}

pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<Client, IngestError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Parse `base_url`, making sure it ends with exactly one slash so that
/// [`Url::join`] appends to the path rather than replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, IngestError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| IngestError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, IngestError> {
    base.join(path).map_err(|e| IngestError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}

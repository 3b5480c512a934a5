//! Incremental fetch, relevance filtering and idempotent persistence for the
//! Reddit, NewsAPI and Google News scrapers.

pub mod adapter;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod runner;
pub mod sources;
pub mod types;

pub use adapter::{GoogleNewsAdapter, NewsApiAdapter, RedditAdapter, SourceAdapter};
pub use error::IngestError;
pub use extract::{FullTextExtractor, HttpExtractor, NoExtraction};
pub use runner::run_job;
pub use sources::{
    AggregatorFeed, DiscussionFeed, GoogleNewsClient, NewsApiClient, RedditClient,
    RedditCredentials, WireFeed,
};
pub use types::{
    Candidate, FetchParams, FetchReport, GoogleNewsItem, ListingKind, ListingPage,
    NewsApiArticle, NewsApiSource, RedditPost, WireQuery, DEFAULT_PAGE_SIZE,
};

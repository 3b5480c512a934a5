//! Candidate items as returned by the vendors, plus the per-invocation
//! parameters and report shared by every adapter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::IngestError;
use crate::normalize::{
    parse_epoch_seconds, parse_rfc2822_or_rfc3339, parse_rfc3339, present, validate_url,
};

/// Default NewsAPI page size, also the vendor maximum.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A Reddit submission as it appears in a listing's `children[].data`.
///
/// Every field defaults so a single odd post cannot fail the whole page;
/// missing identifiers are caught by the normalizer instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RedditPost {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    /// Epoch seconds.
    pub created_utc: Option<f64>,
    pub url: Option<String>,
    pub permalink: Option<String>,
    pub selftext: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewsApiSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One entry of NewsAPI's `/v2/everything` `articles` array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub source: Option<NewsApiSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Snippet; truncated bodies end in `[+N chars]`.
    pub content: Option<String>,
    /// RFC 3339.
    pub published_at: Option<String>,
}

/// One `<item>` from a Google News RSS search feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoogleNewsItem {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Item description with HTML stripped.
    pub description: Option<String>,
    /// RFC 2822.
    pub pub_date: Option<String>,
    /// Publisher display name from `<source>`.
    pub source: Option<String>,
    /// Publisher homepage from `<source url="...">`.
    pub source_url: Option<String>,
}

/// A raw vendor item awaiting filtering and normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Reddit(RedditPost),
    NewsApi(NewsApiArticle),
    GoogleNews(GoogleNewsItem),
}

impl Candidate {
    /// Dedup key: post id, or the article link in the form the store keys
    /// on (parsed and re-serialized when it is a valid URL).
    #[must_use]
    pub fn natural_key(&self) -> Option<String> {
        let article_key = |link: &str| validate_url(link).unwrap_or_else(|_| link.to_string());
        match self {
            Candidate::Reddit(post) => present(post.id.as_ref()).map(str::to_string),
            Candidate::NewsApi(article) => present(article.url.as_ref()).map(article_key),
            Candidate::GoogleNews(item) => present(item.link.as_ref()).map(article_key),
        }
    }

    /// Creation or publication time, `None` when absent or unparseable.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Candidate::Reddit(post) => post.created_utc.and_then(parse_epoch_seconds),
            Candidate::NewsApi(article) => article.published_at.as_deref().and_then(parse_rfc3339),
            Candidate::GoogleNews(item) => {
                item.pub_date.as_deref().and_then(parse_rfc2822_or_rfc3339)
            }
        }
    }

    /// Text the relevance classifier sees: title plus body.
    #[must_use]
    pub fn relevance_text(&self) -> String {
        let (title, body) = match self {
            Candidate::Reddit(post) => (&post.title, &post.selftext),
            Candidate::NewsApi(article) => (&article.title, &article.description),
            Candidate::GoogleNews(item) => (&item.title, &item.description),
        };
        format!(
            "{} {}",
            title.as_deref().unwrap_or_default(),
            body.as_deref().unwrap_or_default()
        )
    }
}

/// Reddit listing ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingKind {
    Top,
    Hot,
    #[default]
    New,
    Rising,
}

impl ListingKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Top => "top",
            ListingKind::Hot => "hot",
            ListingKind::New => "new",
            ListingKind::Rising => "rising",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(ListingKind::Top),
            "hot" => Ok(ListingKind::Hot),
            "new" => Ok(ListingKind::New),
            "rising" => Ok(ListingKind::Rising),
            other => Err(IngestError::InvalidParams(format!(
                "unsupported listing kind {other:?}; expected top, hot, new or rising"
            ))),
        }
    }
}

/// One page of a subreddit listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub posts: Vec<RedditPost>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    pub after: Option<String>,
}

/// One `/v2/everything` request.
#[derive(Debug, Clone, PartialEq)]
pub struct WireQuery {
    pub query: String,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    /// Lower publication bound, inclusive at the vendor.
    pub from: Option<DateTime<Utc>>,
}

/// Parameters for a single adapter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchParams {
    /// Per-key cap on candidates examined and records persisted.
    pub limit: usize,
    /// Only consider items newer than the stored watermark.
    pub incremental: bool,
    /// NewsAPI page size.
    pub page_size: usize,
}

impl FetchParams {
    #[must_use]
    pub fn new(limit: usize, incremental: bool) -> Self {
        Self {
            limit,
            incremental,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// # Errors
    ///
    /// Returns [`IngestError::InvalidParams`] if `limit` or `page_size` is zero.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.limit == 0 {
            return Err(IngestError::InvalidParams(
                "limit must be greater than zero".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(IngestError::InvalidParams(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome counters for one adapter invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub persisted: usize,
    /// Not newer than the watermark.
    pub stale: usize,
    pub irrelevant: usize,
    /// Already seen earlier in the same cycle.
    pub duplicate: usize,
    /// Failed normalization (missing id, missing or bad URL).
    pub malformed: usize,
    pub failed_writes: usize,
    pub failed_requests: usize,
}

impl FetchReport {
    pub fn merge(&mut self, other: FetchReport) {
        self.persisted += other.persisted;
        self.stale += other.stale;
        self.irrelevant += other.irrelevant;
        self.duplicate += other.duplicate;
        self.malformed += other.malformed;
        self.failed_writes += other.failed_writes;
        self.failed_requests += other.failed_requests;
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "persisted={} stale={} irrelevant={} duplicate={} malformed={} failed_writes={} failed_requests={}",
            self.persisted,
            self.stale,
            self.irrelevant,
            self.duplicate,
            self.malformed,
            self.failed_writes,
            self.failed_requests
        )
    }
}

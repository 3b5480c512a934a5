//! Canonical record shapes persisted by the ingest pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// External source a record or watermark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Reddit subreddit listings (discussion posts).
    Reddit,
    /// NewsAPI `/v2/everything` (wire-service articles).
    NewsApi,
    /// Google News search feed (aggregated-news articles).
    GoogleNews,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Reddit,
        SourceKind::NewsApi,
        SourceKind::GoogleNews,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Reddit => "reddit",
            SourceKind::NewsApi => "newsapi",
            SourceKind::GoogleNews => "gnews",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reddit" => Ok(SourceKind::Reddit),
            "newsapi" => Ok(SourceKind::NewsApi),
            "gnews" | "googlenews" | "google_news" => Ok(SourceKind::GoogleNews),
            other => Err(CoreError::UnknownSource(other.to_string())),
        }
    }
}

/// Identifies one incremental-fetch cursor: a source, optionally narrowed to
/// a community (subreddit) within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatermarkKey {
    pub source: SourceKind,
    pub scope: Option<String>,
}

impl WatermarkKey {
    #[must_use]
    pub fn source(source: SourceKind) -> Self {
        Self {
            source,
            scope: None,
        }
    }

    #[must_use]
    pub fn community(source: SourceKind, community: &str) -> Self {
        Self {
            source,
            scope: Some(community.to_string()),
        }
    }

    /// Scope column value; the source-wide cursor is stored as `""`.
    #[must_use]
    pub fn scope_str(&self) -> &str {
        self.scope.as_deref().unwrap_or("")
    }
}

impl fmt::Display for WatermarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, &self.scope) {
            (SourceKind::Reddit, Some(sub)) => write!(f, "reddit/r/{sub}"),
            (source, Some(scope)) => write!(f, "{source}/{scope}"),
            (source, None) => write!(f, "{source}"),
        }
    }
}

/// A Reddit submission ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionPost {
    /// Reddit base36 post id, the natural key.
    pub id: String,
    pub title: String,
    /// Author display name, `"unknown"` for deleted accounts.
    pub author: Option<String>,
    pub subreddit: Option<String>,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    pub created_at: DateTime<Utc>,
    /// Outbound link (or the post itself for self posts).
    pub url: Option<String>,
    /// Absolute `https://reddit.com/...` permalink.
    pub permalink: String,
    pub selftext: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// A news article from either article source; the URL is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Vendor-provided snippet, possibly truncated.
    pub content: Option<String>,
    /// Full article body, only fetched when `content` was truncated.
    pub expanded_content: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// One persisted entity, tagged with the collection it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    DiscussionPost(DiscussionPost),
    WireArticle(Article),
    AggregatedArticle(Article),
}

impl CanonicalRecord {
    #[must_use]
    pub fn source(&self) -> SourceKind {
        match self {
            CanonicalRecord::DiscussionPost(_) => SourceKind::Reddit,
            CanonicalRecord::WireArticle(_) => SourceKind::NewsApi,
            CanonicalRecord::AggregatedArticle(_) => SourceKind::GoogleNews,
        }
    }

    /// Post id for discussion posts, canonical URL for articles.
    #[must_use]
    pub fn natural_key(&self) -> &str {
        match self {
            CanonicalRecord::DiscussionPost(post) => &post.id,
            CanonicalRecord::WireArticle(article) | CanonicalRecord::AggregatedArticle(article) => {
                &article.url
            }
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            CanonicalRecord::DiscussionPost(post) => &post.title,
            CanonicalRecord::WireArticle(article) | CanonicalRecord::AggregatedArticle(article) => {
                &article.title
            }
        }
    }
}

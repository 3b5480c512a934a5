//! Candidate → canonical record mapping.
//!
//! Each source has an explicit mapping. Only a missing id, a missing URL or a
//! malformed URL fails a record; every other absent field resolves to `None`
//! (or `""` for titles). Truncated article snippets are enriched through the
//! [`FullTextExtractor`], whose failure never fails the record.

use ainews_core::{Article, CanonicalRecord, DiscussionPost};
use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::error::IngestError;
use crate::extract::FullTextExtractor;
use crate::types::{Candidate, GoogleNewsItem, NewsApiArticle, RedditPost};

pub const REDDIT_BASE_URL: &str = "https://reddit.com";
const UNKNOWN: &str = "unknown";
const TRUNCATION_MARKER: &str = "[+";

/// Map any candidate onto its canonical record.
///
/// # Errors
///
/// Returns [`IngestError::MissingField`] when the natural key is absent and
/// [`IngestError::InvalidUrl`] when an article URL is not a valid http(s) URL.
pub async fn normalize(
    candidate: &Candidate,
    extractor: &dyn FullTextExtractor,
    saved_at: DateTime<Utc>,
) -> Result<CanonicalRecord, IngestError> {
    match candidate {
        Candidate::Reddit(post) => {
            normalize_post(post, saved_at).map(CanonicalRecord::DiscussionPost)
        }
        Candidate::NewsApi(article) => normalize_wire_article(article, extractor, saved_at)
            .await
            .map(CanonicalRecord::WireArticle),
        Candidate::GoogleNews(item) => {
            normalize_aggregated_item(item, saved_at).map(CanonicalRecord::AggregatedArticle)
        }
    }
}

/// # Errors
///
/// Returns [`IngestError::MissingField`] if the post has no id.
pub fn normalize_post(
    post: &RedditPost,
    saved_at: DateTime<Utc>,
) -> Result<DiscussionPost, IngestError> {
    let id = present(post.id.as_ref()).ok_or(IngestError::MissingField("id"))?;

    let permalink = match present(post.permalink.as_ref()) {
        Some(link) if link.starts_with("http://") || link.starts_with("https://") => {
            link.to_string()
        }
        Some(link) => format!("{REDDIT_BASE_URL}{link}"),
        None => format!("{REDDIT_BASE_URL}/comments/{id}/"),
    };

    Ok(DiscussionPost {
        id: id.to_string(),
        title: post.title.clone().unwrap_or_default(),
        author: Some(present(post.author.as_ref()).unwrap_or(UNKNOWN).to_string()),
        subreddit: Some(present(post.subreddit.as_ref()).unwrap_or(UNKNOWN).to_string()),
        score: post.score,
        upvote_ratio: post.upvote_ratio,
        num_comments: post.num_comments,
        created_at: post
            .created_utc
            .and_then(parse_epoch_seconds)
            .unwrap_or(saved_at),
        url: owned(post.url.as_ref()),
        permalink,
        selftext: owned(post.selftext.as_ref()),
        saved_at,
    })
}

/// # Errors
///
/// Returns [`IngestError::MissingField`] or [`IngestError::InvalidUrl`] for a
/// missing or malformed article URL.
pub async fn normalize_wire_article(
    article: &NewsApiArticle,
    extractor: &dyn FullTextExtractor,
    saved_at: DateTime<Utc>,
) -> Result<Article, IngestError> {
    let url = validate_url(present(article.url.as_ref()).ok_or(IngestError::MissingField("url"))?)?;
    let content = owned(article.content.as_ref());
    let expanded_content = expand(&url, content.as_deref(), extractor).await;
    let source = article.source.as_ref();

    Ok(Article {
        title: article.title.clone().unwrap_or_default(),
        author: owned(article.author.as_ref()),
        description: owned(article.description.as_ref()),
        content,
        expanded_content,
        published_at: article
            .published_at
            .as_deref()
            .and_then(parse_rfc3339)
            .unwrap_or(saved_at),
        source_id: source.and_then(|s| owned(s.id.as_ref())),
        source_name: source.and_then(|s| owned(s.name.as_ref())),
        saved_at,
        url,
    })
}

/// Google News items carry no article body, only a description, so there is
/// never a truncated snippet to expand.
///
/// # Errors
///
/// Returns [`IngestError::MissingField`] or [`IngestError::InvalidUrl`] for a
/// missing or malformed link.
pub fn normalize_aggregated_item(
    item: &GoogleNewsItem,
    saved_at: DateTime<Utc>,
) -> Result<Article, IngestError> {
    let url = validate_url(present(item.link.as_ref()).ok_or(IngestError::MissingField("url"))?)?;

    Ok(Article {
        title: item.title.clone().unwrap_or_default(),
        author: None,
        description: owned(item.description.as_ref()),
        content: None,
        expanded_content: None,
        published_at: item
            .pub_date
            .as_deref()
            .and_then(parse_rfc2822_or_rfc3339)
            .unwrap_or(saved_at),
        source_id: owned(item.source_url.as_ref()),
        source_name: owned(item.source.as_ref()),
        saved_at,
        url,
    })
}

/// NewsAPI cuts long bodies with a `[+N chars]` sentinel.
#[must_use]
pub fn is_truncated(content: &str) -> bool {
    content.contains(TRUNCATION_MARKER)
}

async fn expand(
    url: &str,
    content: Option<&str>,
    extractor: &dyn FullTextExtractor,
) -> Option<String> {
    let snippet = content?;
    if !is_truncated(snippet) {
        return None;
    }
    let body = extractor.extract(url).await;
    if body.is_none() {
        tracing::debug!(url, "full-text extraction returned nothing");
    }
    body
}

/// Parse an http(s) URL, returning its canonical string form.
///
/// # Errors
///
/// Returns [`IngestError::InvalidUrl`] for unparseable input, non-http(s)
/// schemes, or URLs without a host.
pub fn validate_url(raw: &str) -> Result<String, IngestError> {
    let invalid = |reason: String| IngestError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed.into())
}

/// Epoch seconds (fractional) → UTC, `None` if not representable.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

#[must_use]
pub fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// RSS dates are RFC 2822; some feeds emit RFC 3339 instead.
#[must_use]
pub fn parse_rfc2822_or_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_rfc3339(raw))
}

pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

fn owned(value: Option<&String>) -> Option<String> {
    present(value).map(str::to_string)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::TimeZone;

use super::*;
use crate::types::NewsApiSource;

struct CountingExtractor {
    body: Option<String>,
    calls: AtomicUsize,
}

impl CountingExtractor {
    fn returning(body: Option<&str>) -> Self {
        Self {
            body: body.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FullTextExtractor for CountingExtractor {
    async fn extract(&self, _url: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone()
    }
}

fn saved_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 14, 0, 0, 0).unwrap()
}

fn wire_article(url: &str, content: Option<&str>) -> NewsApiArticle {
    NewsApiArticle {
        source: Some(NewsApiSource {
            id: Some("the-verge".to_string()),
            name: Some("The Verge".to_string()),
        }),
        author: Some("Jane Doe".to_string()),
        title: Some("OpenAI ships a new model".to_string()),
        description: Some("A short description".to_string()),
        url: Some(url.to_string()),
        content: content.map(str::to_string),
        published_at: Some("2024-11-13T09:30:00Z".to_string()),
    }
}

#[test]
fn post_defaults_author_and_subreddit_and_absolutizes_permalink() {
    let post = RedditPost {
        id: Some("1gq4acr".to_string()),
        title: Some("LLM news".to_string()),
        created_utc: Some(1_731_499_200.0),
        permalink: Some("/r/MachineLearning/comments/1gq4acr/llm_news/".to_string()),
        ..RedditPost::default()
    };

    let record = normalize_post(&post, saved_at()).unwrap();

    assert_eq!(record.author.as_deref(), Some("unknown"));
    assert_eq!(record.subreddit.as_deref(), Some("unknown"));
    assert_eq!(
        record.permalink,
        "https://reddit.com/r/MachineLearning/comments/1gq4acr/llm_news/"
    );
    assert_eq!(
        record.created_at,
        Utc.with_ymd_and_hms(2024, 11, 13, 12, 0, 0).unwrap()
    );
    assert_eq!(record.saved_at, saved_at());
}

#[test]
fn post_without_id_is_malformed() {
    let post = RedditPost {
        title: Some("no id".to_string()),
        ..RedditPost::default()
    };
    assert!(matches!(
        normalize_post(&post, saved_at()),
        Err(IngestError::MissingField("id"))
    ));
}

#[test]
fn post_without_timestamp_falls_back_to_saved_at() {
    let post = RedditPost {
        id: Some("x1".to_string()),
        ..RedditPost::default()
    };
    let record = normalize_post(&post, saved_at()).unwrap();
    assert_eq!(record.created_at, saved_at());
    assert_eq!(record.title, "");
}

#[tokio::test]
async fn truncated_snippet_is_expanded() {
    let extractor = CountingExtractor::returning(Some("Full body text."));
    let article = wire_article(
        "https://example.com/openai",
        Some("OpenAI said on Tuesday… [+2841 chars]"),
    );

    let record = normalize_wire_article(&article, &extractor, saved_at())
        .await
        .unwrap();

    assert_eq!(record.expanded_content.as_deref(), Some("Full body text."));
    assert_eq!(record.source_id.as_deref(), Some("the-verge"));
    assert_eq!(record.source_name.as_deref(), Some("The Verge"));
    assert_eq!(
        record.published_at,
        Utc.with_ymd_and_hms(2024, 11, 13, 9, 30, 0).unwrap()
    );
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn complete_snippet_skips_extraction() {
    let extractor = CountingExtractor::returning(Some("unused"));
    let article = wire_article("https://example.com/short", Some("A complete snippet."));

    let record = normalize_wire_article(&article, &extractor, saved_at())
        .await
        .unwrap();

    assert!(record.expanded_content.is_none());
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_extraction_keeps_the_record() {
    let extractor = CountingExtractor::returning(None);
    let article = wire_article("https://example.com/paywalled", Some("Teaser [+900 chars]"));

    let record = normalize_wire_article(&article, &extractor, saved_at())
        .await
        .unwrap();

    assert!(record.expanded_content.is_none());
    assert_eq!(record.content.as_deref(), Some("Teaser [+900 chars]"));
}

#[tokio::test]
async fn malformed_or_missing_url_fails_the_article() {
    let extractor = CountingExtractor::returning(None);

    let bad = wire_article("not a url", None);
    assert!(matches!(
        normalize_wire_article(&bad, &extractor, saved_at()).await,
        Err(IngestError::InvalidUrl { .. })
    ));

    let missing = NewsApiArticle {
        url: None,
        ..wire_article("https://example.com", None)
    };
    assert!(matches!(
        normalize_wire_article(&missing, &extractor, saved_at()).await,
        Err(IngestError::MissingField("url"))
    ));
}

#[test]
fn aggregated_item_maps_publisher_fields() {
    let item = GoogleNewsItem {
        title: Some("Nvidia posts record quarter - Reuters".to_string()),
        link: Some("https://news.google.com/rss/articles/CBMi123".to_string()),
        description: Some("Nvidia posts record quarter Reuters".to_string()),
        pub_date: Some("Wed, 13 Nov 2024 08:00:00 GMT".to_string()),
        source: Some("Reuters".to_string()),
        source_url: Some("https://www.reuters.com".to_string()),
    };

    let record = normalize_aggregated_item(&item, saved_at()).unwrap();

    assert_eq!(record.source_name.as_deref(), Some("Reuters"));
    assert_eq!(record.source_id.as_deref(), Some("https://www.reuters.com"));
    assert_eq!(
        record.published_at,
        Utc.with_ymd_and_hms(2024, 11, 13, 8, 0, 0).unwrap()
    );
    assert!(record.content.is_none());
    assert!(record.author.is_none());
}

#[test]
fn validate_url_accepts_http_only() {
    assert!(validate_url("https://example.com/a?b=c").is_ok());
    assert!(validate_url("http://example.com").is_ok());
    assert!(validate_url("ftp://example.com/file").is_err());
    assert!(validate_url("mailto:someone@example.com").is_err());
    assert!(validate_url("/relative/path").is_err());
}

#[test]
fn truncation_marker_detection() {
    assert!(is_truncated("Some text… [+1234 chars]"));
    assert!(!is_truncated("Some text."));
}

#[test]
fn rss_dates_fall_back_to_rfc3339() {
    assert_eq!(
        parse_rfc2822_or_rfc3339("2024-11-13T08:00:00+00:00"),
        Some(Utc.with_ymd_and_hms(2024, 11, 13, 8, 0, 0).unwrap())
    );
    assert!(parse_rfc2822_or_rfc3339("yesterday").is_none());
    assert!(parse_epoch_seconds(f64::NAN).is_none());
}

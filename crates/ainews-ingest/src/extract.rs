//! Full-text extraction for truncated article snippets.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::IngestError;
use crate::sources::build_http_client;

/// Paragraphs shorter than this are navigation chrome, captions or bylines.
const MIN_PARAGRAPH_CHARS: usize = 40;

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid noise regex")
});
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));

/// Fetches the readable body of an article page.
#[async_trait]
pub trait FullTextExtractor: Send + Sync {
    /// Article body, or `None` on any failure or when nothing readable was found.
    async fn extract(&self, url: &str) -> Option<String>;
}

/// Extractor for sources that never need expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtraction;

#[async_trait]
impl FullTextExtractor for NoExtraction {
    async fn extract(&self, _url: &str) -> Option<String> {
        None
    }
}

/// Downloads the page and joins its substantial `<p>` paragraphs.
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, IngestError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl FullTextExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Option<String> {
        match self.fetch_html(url).await {
            Ok(html) => extract_article_text(&html),
            Err(e) => {
                tracing::debug!(url, error = %e, "article download failed");
                None
            }
        }
    }
}

/// Join the page's substantial paragraphs with blank lines.
///
/// Script, style and noscript blocks are dropped first so inline JSON never
/// leaks into the text.
#[must_use]
pub fn extract_article_text(html: &str) -> Option<String> {
    let cleaned = NOISE_RE.replace_all(html, " ");
    let paragraphs: Vec<String> = PARAGRAPH_RE
        .captures_iter(&cleaned)
        .map(|cap| clean_text(cap.get(1).map_or("", |m| m.as_str())))
        .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Strip tags, decode the common entities and collapse whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let no_tags = TAG_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

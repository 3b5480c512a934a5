//! Google News RSS search client.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::{Client, Url};

use super::{build_http_client, join_path, parse_base_url, AggregatorFeed};
use crate::error::IngestError;
use crate::extract::clean_text;
use crate::types::GoogleNewsItem;

const DEFAULT_BASE_URL: &str = "https://news.google.com/";
const VENDOR: &str = "Google News";

/// Search window appended to every topic query.
pub const SEARCH_WINDOW: &str = "when:30d";

pub struct GoogleNewsClient {
    client: Client,
    base_url: Url,
}

impl GoogleNewsClient {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, IngestError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be constructed,
    /// or [`IngestError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    fn search_url(&self, topic: &str) -> Result<Url, IngestError> {
        let query = format!("{topic} {SEARCH_WINDOW}");
        let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();
        let mut url = join_path(&self.base_url, "rss/search")?;
        url.set_query(Some(&format!("q={encoded}&hl=en-US&gl=US&ceid=US:en")));
        Ok(url)
    }
}

#[async_trait]
impl AggregatorFeed for GoogleNewsClient {
    async fn search(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<Vec<GoogleNewsItem>, IngestError> {
        let url = self.search_url(topic)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::api(
                VENDOR,
                format!("search {topic:?} failed with status {}", response.status()),
            ));
        }

        let body = response.text().await?;
        let mut items = parse_search_feed(&body)?;
        items.truncate(max_results);

        tracing::debug!(topic, items = items.len(), "fetched Google News feed");
        Ok(items)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
    Source,
    Other,
}

impl Field {
    fn of(tag: &[u8]) -> Self {
        match tag {
            b"title" => Field::Title,
            b"link" => Field::Link,
            b"description" => Field::Description,
            b"pubDate" => Field::PubDate,
            b"source" => Field::Source,
            _ => Field::Other,
        }
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    source: String,
    source_url: Option<String>,
}

impl ItemBuilder {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Source => &mut self.source,
            Field::Other => return,
        };
        target.push_str(text);
    }

    fn finish(self) -> GoogleNewsItem {
        fn some(s: String) -> Option<String> {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        GoogleNewsItem {
            title: some(self.title),
            link: some(self.link),
            description: some(clean_text(&self.description)),
            pub_date: some(self.pub_date),
            source: some(self.source),
            source_url: self.source_url.and_then(some),
        }
    }
}

fn source_url(tag: &BytesStart<'_>) -> Option<String> {
    let attr = tag.try_get_attribute("url").ok().flatten()?;
    attr.unescape_value().ok().map(|v| v.into_owned())
}

/// Parse a Google News RSS body into items, in feed order.
///
/// `<description>` holds an HTML fragment; its tags are stripped.
///
/// # Errors
///
/// Returns [`IngestError::Xml`] if the XML is malformed.
pub fn parse_search_feed(xml: &str) -> Result<Vec<GoogleNewsItem>, IngestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    let mut field = Field::Other;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => {
                    current = Some(ItemBuilder::default());
                    field = Field::Other;
                }
                tag => {
                    field = Field::of(tag);
                    if let (Field::Source, Some(item)) = (field, current.as_mut()) {
                        item.source_url = source_url(&e);
                    }
                }
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item.finish());
                    }
                }
                field = Field::Other;
            }
            Ok(Event::Text(e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    item.push(field, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(item) = current.as_mut() {
                    item.push(field, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

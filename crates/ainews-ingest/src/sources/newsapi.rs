//! NewsAPI `/v2/everything` client.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{build_http_client, join_path, parse_base_url, WireFeed};
use crate::error::IngestError;
use crate::types::{NewsApiArticle, WireQuery};

const DEFAULT_BASE_URL: &str = "https://newsapi.org/";
const VENDOR: &str = "NewsAPI";

/// NewsAPI's per-request page size cap.
pub const MAX_PAGE_SIZE: usize = 100;

/// Response envelope. Errors arrive as `{"status":"error","code":…,"message":…}`,
/// usually with a 4xx status.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl NewsApiClient {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, IngestError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be constructed,
    /// or [`IngestError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
        })
    }

    fn everything_url(&self, query: &WireQuery) -> Result<Url, IngestError> {
        let mut url = join_path(&self.base_url, "v2/everything")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.query);
            pairs.append_pair("language", "en");
            pairs.append_pair("sortBy", "publishedAt");
            pairs.append_pair("pageSize", &query.page_size.min(MAX_PAGE_SIZE).to_string());
            pairs.append_pair("page", &query.page.to_string());
            if let Some(from) = query.from {
                pairs.append_pair("from", &from.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl WireFeed for NewsApiClient {
    async fn everything(&self, query: &WireQuery) -> Result<Vec<NewsApiArticle>, IngestError> {
        let url = self.everything_url(query)?;
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(IngestError::api(
                    VENDOR,
                    format!("everything failed with status {status}"),
                ));
            }
            Err(e) => {
                return Err(IngestError::Deserialize {
                    context: format!("everything(page={})", query.page),
                    source: e,
                });
            }
        };

        if envelope.status != "ok" || !status.is_success() {
            return Err(IngestError::api(
                VENDOR,
                format!(
                    "{} ({status}): {}",
                    envelope.code.as_deref().unwrap_or("error"),
                    envelope.message.as_deref().unwrap_or("no message")
                ),
            ));
        }

        tracing::debug!(
            page = query.page,
            articles = envelope.articles.len(),
            "fetched NewsAPI page"
        );
        Ok(envelope.articles)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn everything_url_carries_paging_and_watermark() {
        let client =
            NewsApiClient::with_base_url("key", 30, "ua", "https://newsapi.org").unwrap();
        let url = client
            .everything_url(&WireQuery {
                query: "\"AI\" OR \"LLM\"".to_string(),
                page: 2,
                page_size: 250,
                from: Some(Utc.with_ymd_and_hms(2024, 11, 13, 12, 0, 0).unwrap()),
            })
            .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(url.path(), "/v2/everything");
        assert_eq!(get("q"), Some("\"AI\" OR \"LLM\""));
        assert_eq!(get("pageSize"), Some("100"));
        assert_eq!(get("page"), Some("2"));
        assert_eq!(get("sortBy"), Some("publishedAt"));
        assert_eq!(get("from"), Some("2024-11-13T12:00:00Z"));
        assert!(get("apiKey").is_none(), "key travels in a header");
    }
}

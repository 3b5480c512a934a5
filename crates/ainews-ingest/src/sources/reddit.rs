//! Reddit listing client (application-only OAuth, client-credentials grant).

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{build_http_client, join_path, parse_base_url, DiscussionFeed};
use crate::error::IngestError;
use crate::types::{ListingKind, ListingPage, RedditPost};

const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com/";
const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com/";
const VENDOR: &str = "Reddit";

/// Reddit's per-request listing cap.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RedditPost,
}

/// Reddit API client holding an application access token.
pub struct RedditClient {
    client: Client,
    token: String,
    api_base: Url,
}

impl RedditClient {
    /// Exchange client credentials for a token against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] on transport failure and
    /// [`IngestError::Api`] if Reddit rejects the credentials.
    pub async fn connect(
        credentials: &RedditCredentials,
        timeout_secs: u64,
    ) -> Result<Self, IngestError> {
        Self::with_base_urls(
            credentials,
            timeout_secs,
            DEFAULT_AUTH_BASE_URL,
            DEFAULT_API_BASE_URL,
        )
        .await
    }

    /// Like [`RedditClient::connect`] but against custom token and API hosts
    /// (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`RedditClient::connect`], plus [`IngestError::InvalidUrl`] for
    /// unparseable base URLs.
    pub async fn with_base_urls(
        credentials: &RedditCredentials,
        timeout_secs: u64,
        auth_base_url: &str,
        api_base_url: &str,
    ) -> Result<Self, IngestError> {
        // Reddit throttles generic user agents, so the configured one is used
        // for every request.
        let client = build_http_client(timeout_secs, &credentials.user_agent)?;
        let auth_base = parse_base_url(auth_base_url)?;
        let api_base = parse_base_url(api_base_url)?;
        let token = Self::fetch_token(&client, &auth_base, credentials).await?;

        Ok(Self {
            client,
            token,
            api_base,
        })
    }

    async fn fetch_token(
        client: &Client,
        auth_base: &Url,
        credentials: &RedditCredentials,
    ) -> Result<String, IngestError> {
        let url = join_path(auth_base, "api/v1/access_token")?;
        let response = client
            .post(url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::api(
                VENDOR,
                format!("token exchange failed with status {}", response.status()),
            ));
        }

        let body = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| IngestError::Deserialize {
                context: "reddit access_token".to_string(),
                source: e,
            })?;

        match (token.access_token, token.error) {
            (Some(access_token), None) if !access_token.is_empty() => {
                tracing::debug!("obtained Reddit application token");
                Ok(access_token)
            }
            (_, Some(error)) => Err(IngestError::api(
                VENDOR,
                format!("token exchange rejected: {error}"),
            )),
            _ => Err(IngestError::api(VENDOR, "token response had no access_token")),
        }
    }

    fn listing_url(&self, community: &str, kind: ListingKind) -> Result<Url, IngestError> {
        join_path(&self.api_base, &format!("r/{community}/{kind}"))
    }
}

#[async_trait]
impl DiscussionFeed for RedditClient {
    async fn listing(
        &self,
        community: &str,
        kind: ListingKind,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingPage, IngestError> {
        let url = self.listing_url(community, kind)?;

        let mut params: Vec<(&str, String)> = vec![
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if kind == ListingKind::Top {
            params.push(("t", "all".to_string()));
        }
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::api(
                VENDOR,
                format!(
                    "r/{community}/{kind} listing failed with status {}",
                    response.status()
                ),
            ));
        }

        let body = response.text().await?;
        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| IngestError::Deserialize {
                context: format!("r/{community}/{kind} listing"),
                source: e,
            })?;

        let posts: Vec<RedditPost> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect();

        tracing::debug!(
            community,
            %kind,
            posts = posts.len(),
            has_more = listing.data.after.is_some(),
            "fetched Reddit listing page"
        );

        Ok(ListingPage {
            posts,
            after: listing.data.after.filter(|cursor| !cursor.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_secret() {
        let credentials = RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "s3cr3t".to_string(),
            user_agent: "ainews-test".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("s3cr3t"));
    }
}

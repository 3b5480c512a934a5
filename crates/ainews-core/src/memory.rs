//! In-process store used for dry runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::records::{Article, CanonicalRecord, DiscussionPost, SourceKind, WatermarkKey};
use crate::store::{RecordSink, StoreConnector, StoreError, WatermarkStore};

#[derive(Debug, Default)]
struct State {
    watermarks: HashMap<WatermarkKey, DateTime<Utc>>,
    posts: HashMap<String, DiscussionPost>,
    wire_articles: HashMap<String, Article>,
    aggregated_articles: HashMap<String, Article>,
    upsert_calls: usize,
    connects: usize,
    disconnects: usize,
}

/// Map-backed store. Clones share the same state.
///
/// Records are keyed by their natural key, so repeated upserts replace rather
/// than duplicate.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn watermark(&self, key: &WatermarkKey) -> Option<DateTime<Utc>> {
        self.lock().watermarks.get(key).copied()
    }

    /// Seed a watermark directly, bypassing the adapter.
    pub fn set_watermark(&self, key: WatermarkKey, at: DateTime<Utc>) {
        self.lock().watermarks.insert(key, at);
    }

    /// All cursors, sorted by key for stable output.
    #[must_use]
    pub fn watermarks(&self) -> Vec<(WatermarkKey, DateTime<Utc>)> {
        let mut out: Vec<_> = self
            .lock()
            .watermarks
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
        out
    }

    #[must_use]
    pub fn post(&self, id: &str) -> Option<DiscussionPost> {
        self.lock().posts.get(id).cloned()
    }

    #[must_use]
    pub fn article(&self, source: SourceKind, url: &str) -> Option<Article> {
        let state = self.lock();
        match source {
            SourceKind::NewsApi => state.wire_articles.get(url).cloned(),
            SourceKind::GoogleNews => state.aggregated_articles.get(url).cloned(),
            SourceKind::Reddit => None,
        }
    }

    /// Number of distinct stored records for `source`.
    #[must_use]
    pub fn count(&self, source: SourceKind) -> usize {
        let state = self.lock();
        match source {
            SourceKind::Reddit => state.posts.len(),
            SourceKind::NewsApi => state.wire_articles.len(),
            SourceKind::GoogleNews => state.aggregated_articles.len(),
        }
    }

    /// Total `upsert` calls accepted, including replacements.
    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.lock().upsert_calls
    }

    /// `(connects, disconnects)` seen through [`StoreConnector`].
    #[must_use]
    pub fn connection_counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.connects, state.disconnects)
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn get(&self, key: &WatermarkKey) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.watermark(key))
    }

    async fn set(&self, key: &WatermarkKey, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.set_watermark(key.clone(), at);
        Ok(())
    }
}

#[async_trait]
impl RecordSink for MemoryStore {
    async fn upsert(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        match record {
            CanonicalRecord::DiscussionPost(post) => {
                state.posts.insert(post.id.clone(), post.clone());
            }
            CanonicalRecord::WireArticle(article) => {
                state
                    .wire_articles
                    .insert(article.url.clone(), article.clone());
            }
            CanonicalRecord::AggregatedArticle(article) => {
                state
                    .aggregated_articles
                    .insert(article.url.clone(), article.clone());
            }
        }
        state.upsert_calls += 1;
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    type Store = MemoryStore;

    async fn connect(&self) -> Result<MemoryStore, StoreError> {
        self.lock().connects += 1;
        Ok(self.clone())
    }

    async fn disconnect(&self, store: MemoryStore) {
        store.lock().disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn post(id: &str, title: &str, score: i64) -> CanonicalRecord {
        let at = Utc.with_ymd_and_hms(2025, 11, 8, 9, 0, 0).unwrap();
        CanonicalRecord::DiscussionPost(DiscussionPost {
            id: id.to_string(),
            title: title.to_string(),
            author: Some("unknown".to_string()),
            subreddit: Some("artificial".to_string()),
            score,
            upvote_ratio: Some(0.95),
            num_comments: 3,
            created_at: at,
            url: None,
            permalink: format!("https://reddit.com/r/artificial/comments/{id}/"),
            selftext: None,
            saved_at: at,
        })
    }

    #[tokio::test]
    async fn upserting_same_key_twice_keeps_one_record_with_latest_values() {
        let store = MemoryStore::new();
        store.upsert(&post("abc", "first", 1)).await.unwrap();
        store.upsert(&post("abc", "second", 42)).await.unwrap();

        assert_eq!(store.count(SourceKind::Reddit), 1);
        assert_eq!(store.upsert_calls(), 2);
        let stored = store.post("abc").expect("post stored");
        assert_eq!(stored.title, "second");
        assert_eq!(stored.score, 42);
    }

    #[tokio::test]
    async fn watermark_get_returns_none_until_set() {
        let store = MemoryStore::new();
        let key = WatermarkKey::community(SourceKind::Reddit, "artificial");
        assert_eq!(store.get(&key).await.unwrap(), None);

        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.set(&key, at).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(at));
        assert_eq!(
            store
                .get(&WatermarkKey::community(SourceKind::Reddit, "technology"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn clones_share_state_and_count_connections() {
        let store = MemoryStore::new();
        let handle = store.connect().await.unwrap();
        handle.upsert(&post("x1", "t", 0)).await.unwrap();
        store.disconnect(handle).await;

        assert_eq!(store.count(SourceKind::Reddit), 1);
        assert_eq!(store.connection_counts(), (1, 1));
    }
}

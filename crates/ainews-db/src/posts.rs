//! Database operations for the `reddit_posts` table.

use ainews_core::DiscussionPost;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `reddit_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RedditPostRow {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: i64,
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
    pub permalink: String,
    pub selftext: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Upserts a Reddit post.
///
/// Conflicts on `id` replace every other column, so re-fetching a post
/// refreshes its score, ratio and comment count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post(pool: &PgPool, post: &DiscussionPost) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO reddit_posts \
             (id, title, author, subreddit, score, upvote_ratio, num_comments, \
              created_at, url, permalink, selftext, saved_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (id) DO UPDATE SET \
             title        = EXCLUDED.title, \
             author       = EXCLUDED.author, \
             subreddit    = EXCLUDED.subreddit, \
             score        = EXCLUDED.score, \
             upvote_ratio = EXCLUDED.upvote_ratio, \
             num_comments = EXCLUDED.num_comments, \
             created_at   = EXCLUDED.created_at, \
             url          = EXCLUDED.url, \
             permalink    = EXCLUDED.permalink, \
             selftext     = EXCLUDED.selftext, \
             saved_at     = EXCLUDED.saved_at",
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.author)
    .bind(&post.subreddit)
    .bind(post.score)
    .bind(post.upvote_ratio)
    .bind(post.num_comments)
    .bind(post.created_at)
    .bind(&post.url)
    .bind(&post.permalink)
    .bind(&post.selftext)
    .bind(post.saved_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a single post by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post(pool: &PgPool, id: &str) -> Result<Option<RedditPostRow>, DbError> {
    let row = sqlx::query_as::<_, RedditPostRow>(
        "SELECT id, title, author, subreddit, score, upvote_ratio, num_comments, \
                created_at, url, permalink, selftext, saved_at \
         FROM reddit_posts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

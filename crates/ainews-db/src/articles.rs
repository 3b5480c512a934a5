//! Database operations for the `newsapi_articles` and `gnews_articles` tables.
//!
//! Both tables share one shape; [`ArticleTable`] picks the collection.

use ainews_core::Article;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Which article collection a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleTable {
    NewsApi,
    GoogleNews,
}

impl ArticleTable {
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            ArticleTable::NewsApi => "newsapi_articles",
            ArticleTable::GoogleNews => "gnews_articles",
        }
    }
}

/// A row from either article table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub expanded_content: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Upserts an article into `table`.
///
/// Conflicts on `url` replace every other column.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_article(
    pool: &PgPool,
    table: ArticleTable,
    article: &Article,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {} \
             (url, title, author, description, content, expanded_content, \
              published_at, source_id, source_name, saved_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (url) DO UPDATE SET \
             title            = EXCLUDED.title, \
             author           = EXCLUDED.author, \
             description      = EXCLUDED.description, \
             content          = EXCLUDED.content, \
             expanded_content = EXCLUDED.expanded_content, \
             published_at     = EXCLUDED.published_at, \
             source_id        = EXCLUDED.source_id, \
             source_name      = EXCLUDED.source_name, \
             saved_at         = EXCLUDED.saved_at",
        table.table_name()
    );

    sqlx::query(&sql)
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.author)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.expanded_content)
        .bind(article.published_at)
        .bind(&article.source_id)
        .bind(&article.source_name)
        .bind(article.saved_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Fetch one article from `table` by URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article(
    pool: &PgPool,
    table: ArticleTable,
    url: &str,
) -> Result<Option<ArticleRow>, DbError> {
    let sql = format!(
        "SELECT url, title, author, description, content, expanded_content, \
                published_at, source_id, source_name, saved_at \
         FROM {} WHERE url = $1",
        table.table_name()
    );

    let row = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(url)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

//! Database operations for the `scrape_watermarks` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `scrape_watermarks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WatermarkRow {
    pub source: String,
    /// Empty string for source-wide cursors, subreddit name otherwise.
    pub scope: String,
    pub last_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Return the stored cursor for `(source, scope)`, or `None` if unset.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_watermark(
    pool: &PgPool,
    source: &str,
    scope: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let at = sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT last_seen_at FROM scrape_watermarks WHERE source = $1 AND scope = $2",
    )
    .bind(source)
    .bind(scope)
    .fetch_optional(pool)
    .await?;

    Ok(at)
}

/// Create or overwrite the cursor for `(source, scope)`.
///
/// Plain overwrite: monotonicity is the caller's responsibility.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_watermark(
    pool: &PgPool,
    source: &str,
    scope: &str,
    last_seen_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scrape_watermarks (source, scope, last_seen_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (source, scope) DO UPDATE SET \
             last_seen_at = EXCLUDED.last_seen_at, \
             updated_at   = NOW()",
    )
    .bind(source)
    .bind(scope)
    .bind(last_seen_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// List every cursor ordered by source then scope.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_watermarks(pool: &PgPool) -> Result<Vec<WatermarkRow>, DbError> {
    let rows = sqlx::query_as::<_, WatermarkRow>(
        "SELECT source, scope, last_seen_at, updated_at \
         FROM scrape_watermarks \
         ORDER BY source, scope",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

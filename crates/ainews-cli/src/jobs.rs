//! Job assembly for the CLI and the scheduler.
//!
//! Vendor clients are built from [`AppConfig`] on every invocation, so a
//! retried job gets a fresh Reddit token. Missing credentials are fatal for
//! the job that needs them and nothing else.

use ainews_core::{AppConfig, MemoryStore, RelevanceClassifier, SourceKind, StoreConnector};
use ainews_db::PgConnector;
use ainews_ingest::{
    run_job, FetchParams, FetchReport, GoogleNewsAdapter, GoogleNewsClient, HttpExtractor,
    ListingKind, NewsApiAdapter, NewsApiClient, RedditAdapter, RedditClient, RedditCredentials,
    SourceAdapter,
};
use anyhow::Context;

/// Per-source limits used when `--limit` is not given and by the daily
/// schedule.
#[must_use]
pub(crate) fn default_limit(source: SourceKind) -> usize {
    match source {
        SourceKind::Reddit => 1000,
        SourceKind::NewsApi => 100,
        SourceKind::GoogleNews => 900,
    }
}

#[must_use]
pub(crate) fn fetch_params(
    source: SourceKind,
    limit: Option<usize>,
    incremental: bool,
    page_size: Option<usize>,
) -> FetchParams {
    let params = FetchParams::new(limit.unwrap_or_else(|| default_limit(source)), incremental);
    match page_size {
        Some(size) => params.with_page_size(size),
        None => params,
    }
}

/// Reddit credentials from config.
///
/// # Errors
///
/// Returns an error naming the first missing `REDDIT_*` variable.
pub(crate) fn reddit_credentials(config: &AppConfig) -> anyhow::Result<RedditCredentials> {
    let client_id = config
        .reddit_client_id
        .clone()
        .context("REDDIT_CLIENT_ID is not set")?;
    let client_secret = config
        .reddit_client_secret
        .clone()
        .context("REDDIT_CLIENT_SECRET is not set")?;
    let user_agent = config
        .reddit_user_agent
        .clone()
        .context("REDDIT_USER_AGENT is not set")?;

    Ok(RedditCredentials {
        client_id,
        client_secret,
        user_agent,
    })
}

/// Build the adapter for `source`, wiring in its vendor client.
///
/// # Errors
///
/// Returns an error if credentials are missing, the relevance keywords do not
/// compile, a client cannot be built, or Reddit rejects the token exchange.
pub(crate) async fn build_adapter(
    config: &AppConfig,
    source: SourceKind,
    listing: ListingKind,
) -> anyhow::Result<Box<dyn SourceAdapter>> {
    let timeout = config.http_request_timeout_secs;

    let adapter: Box<dyn SourceAdapter> = match source {
        SourceKind::Reddit => {
            let credentials = reddit_credentials(config)?;
            let classifier =
                RelevanceClassifier::new(&config.keywords, &config.exclusion_terms)
                    .context("failed to build relevance classifier")?;
            let client = RedditClient::connect(&credentials, timeout)
                .await
                .context("Reddit token exchange failed")?;
            Box::new(RedditAdapter::new(
                client,
                config.target_subreddits.clone(),
                listing,
                classifier,
            )?)
        }
        SourceKind::NewsApi => {
            let key = config
                .newsapi_key
                .as_deref()
                .context("NEWSAPI_KEY is not set")?;
            let client = NewsApiClient::new(key, timeout, &config.http_user_agent)?;
            let extractor = HttpExtractor::new(timeout, &config.http_user_agent)?;
            Box::new(NewsApiAdapter::new(
                client,
                extractor,
                config.newsapi_query.clone(),
            ))
        }
        SourceKind::GoogleNews => {
            let client = GoogleNewsClient::new(timeout, &config.http_user_agent)?;
            let extractor = HttpExtractor::new(timeout, &config.http_user_agent)?;
            Box::new(GoogleNewsAdapter::new(
                client,
                extractor,
                config.gnews_topics.clone(),
                config.gnews_max_results,
            )?)
        }
    };

    Ok(adapter)
}

/// Build the adapter for `source` and run one job against `connector`.
///
/// # Errors
///
/// Returns an error if the adapter cannot be built or the job fails fatally.
pub(crate) async fn run_source<C: StoreConnector>(
    connector: &C,
    config: &AppConfig,
    source: SourceKind,
    listing: ListingKind,
    params: &FetchParams,
) -> anyhow::Result<FetchReport> {
    let adapter = build_adapter(config, source, listing)
        .await
        .with_context(|| format!("failed to set up {source} job"))?;
    let report = run_job(connector, adapter.as_ref(), params)
        .await
        .with_context(|| format!("{source} job failed"))?;
    Ok(report)
}

/// Flags shared by every job of one `scrape` invocation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScrapeOptions {
    pub(crate) limit: Option<usize>,
    pub(crate) incremental: bool,
    pub(crate) page_size: Option<usize>,
    pub(crate) listing: ListingKind,
    pub(crate) dry_run: bool,
}

/// Run one job per source, in order. A failed job does not stop the rest.
///
/// With `dry_run` the jobs write to an in-memory store instead of Postgres.
///
/// # Errors
///
/// Returns an error naming the failed sources if any job failed.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    sources: &[SourceKind],
    options: ScrapeOptions,
) -> anyhow::Result<()> {
    let failed = if options.dry_run {
        let store = MemoryStore::new();
        let failed = run_all(&store, config, sources, options).await;
        for line in dry_run_summary(&store, sources) {
            println!("{line}");
        }
        failed
    } else {
        let connector = PgConnector::from_app_config(config);
        run_all(&connector, config, sources, options).await
    };

    if failed.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
    anyhow::bail!(
        "{} of {} jobs failed: [{}]",
        failed.len(),
        sources.len(),
        names.join(", ")
    )
}

/// Record counts and would-be watermarks left in a dry-run store.
pub(crate) fn dry_run_summary(store: &MemoryStore, sources: &[SourceKind]) -> Vec<String> {
    let mut lines: Vec<String> = sources
        .iter()
        .map(|&source| {
            format!(
                "dry-run: {source}: {} records held in memory, nothing written",
                store.count(source)
            )
        })
        .collect();
    lines.extend(
        store
            .watermarks()
            .into_iter()
            .map(|(key, at)| format!("dry-run: watermark {key} -> {}", at.to_rfc3339())),
    );
    lines
}

/// Returns the sources whose job failed.
pub(crate) async fn run_all<C: StoreConnector>(
    connector: &C,
    config: &AppConfig,
    sources: &[SourceKind],
    options: ScrapeOptions,
) -> Vec<SourceKind> {
    let mut failed = Vec::new();

    for &source in sources {
        let params = fetch_params(
            source,
            options.limit,
            options.incremental,
            options.page_size,
        );
        match run_source(connector, config, source, options.listing, &params).await {
            Ok(report) => println!("{source}: {report}"),
            Err(e) => {
                eprintln!("error: {e:#}");
                failed.push(source);
            }
        }
    }

    failed
}

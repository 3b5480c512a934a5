use ainews_core::{AppConfig, Environment, MemoryStore, WatermarkKey};
use ainews_ingest::SourceAdapter;
use chrono::{TimeZone, Utc};

use super::*;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: None,
        newsapi_key: None,
        target_subreddits: vec!["MachineLearning".to_string()],
        keywords: vec!["ai".to_string()],
        exclusion_terms: vec![],
        newsapi_query: "\"AI\"".to_string(),
        gnews_topics: vec!["AI".to_string()],
        gnews_max_results: 10,
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        http_request_timeout_secs: 5,
        http_user_agent: "ainews-test".to_string(),
    }
}

fn options() -> jobs::ScrapeOptions {
    jobs::ScrapeOptions {
        limit: Some(10),
        incremental: true,
        page_size: None,
        listing: ListingKind::New,
        dry_run: true,
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["ainews-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_scrape_defaults() {
    let cli = Cli::try_parse_from(["ainews-cli", "scrape", "reddit"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            target: Target::Reddit,
            limit: None,
            full: false,
            page_size: None,
            listing: ListingKind::New,
            dry_run: false,
        })
    ));
}

#[test]
fn parses_scrape_with_every_flag() {
    let cli = Cli::try_parse_from([
        "ainews-cli",
        "scrape",
        "all",
        "--limit",
        "5",
        "--full",
        "--page-size",
        "20",
        "--listing",
        "top",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            target: Target::All,
            limit: Some(5),
            full: true,
            page_size: Some(20),
            listing: ListingKind::Top,
            dry_run: true,
        })
    ));
}

#[test]
fn scrape_rejects_unknown_target_and_listing() {
    assert!(Cli::try_parse_from(["ainews-cli", "scrape", "twitter"]).is_err());
    assert!(
        Cli::try_parse_from(["ainews-cli", "scrape", "reddit", "--listing", "best"]).is_err()
    );
}

#[test]
fn scrape_requires_a_target() {
    assert!(Cli::try_parse_from(["ainews-cli", "scrape"]).is_err());
}

#[test]
fn parses_db_commands() {
    let cli = Cli::try_parse_from(["ainews-cli", "watermarks"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Watermarks)));

    let cli = Cli::try_parse_from(["ainews-cli", "migrate"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Migrate)));

    let cli = Cli::try_parse_from(["ainews-cli", "schedule"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Schedule)));
}

#[test]
fn target_all_expands_to_every_source() {
    assert_eq!(Target::All.sources(), &SourceKind::ALL);
    assert_eq!(Target::Gnews.sources(), &[SourceKind::GoogleNews]);
}

#[test]
fn fetch_params_fall_back_to_per_source_limits() {
    let reddit = jobs::fetch_params(SourceKind::Reddit, None, true, None);
    assert_eq!(reddit.limit, 1000);
    assert!(reddit.incremental);

    let newsapi = jobs::fetch_params(SourceKind::NewsApi, None, false, Some(50));
    assert_eq!(newsapi.limit, 100);
    assert_eq!(newsapi.page_size, 50);
    assert!(!newsapi.incremental);

    let gnews = jobs::fetch_params(SourceKind::GoogleNews, Some(3), true, None);
    assert_eq!(gnews.limit, 3);
}

#[test]
fn reddit_credentials_name_the_missing_variable() {
    let mut config = app_config();
    config.reddit_client_id = Some("id".to_string());

    let err = jobs::reddit_credentials(&config).unwrap_err();
    assert!(err.to_string().contains("REDDIT_CLIENT_SECRET"));

    config.reddit_client_secret = Some("secret".to_string());
    config.reddit_user_agent = Some("ua".to_string());
    let creds = jobs::reddit_credentials(&config).unwrap();
    assert_eq!(creds.client_id, "id");
}

#[tokio::test]
async fn newsapi_adapter_requires_a_key() {
    let result = jobs::build_adapter(&app_config(), SourceKind::NewsApi, ListingKind::New).await;
    let err = result.err().expect("missing key must be fatal");
    assert!(format!("{err:#}").contains("NEWSAPI_KEY"));
}

#[tokio::test]
async fn gnews_adapter_builds_without_credentials() {
    let adapter = jobs::build_adapter(&app_config(), SourceKind::GoogleNews, ListingKind::New)
        .await
        .unwrap();
    assert_eq!(adapter.source(), SourceKind::GoogleNews);
}

#[tokio::test]
async fn setup_failure_is_reported_without_touching_the_store() {
    let store = MemoryStore::new();
    let failed = jobs::run_all(
        &store,
        &app_config(),
        &[SourceKind::Reddit, SourceKind::NewsApi],
        options(),
    )
    .await;

    assert_eq!(failed, vec![SourceKind::Reddit, SourceKind::NewsApi]);
    assert_eq!(store.connection_counts(), (0, 0));
}

#[tokio::test]
async fn scrape_fails_when_any_job_fails() {
    let err = jobs::run_scrape(&app_config(), &[SourceKind::NewsApi], options())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 of 1 jobs failed"));
}

#[test]
fn dry_run_summary_lists_counts_and_watermarks() {
    let store = MemoryStore::new();
    let at = Utc.with_ymd_and_hms(2024, 11, 13, 8, 0, 0).unwrap();
    store.set_watermark(WatermarkKey::source(SourceKind::GoogleNews), at);

    let lines = jobs::dry_run_summary(&store, &[SourceKind::GoogleNews]);
    assert_eq!(
        lines,
        vec![
            "dry-run: gnews: 0 records held in memory, nothing written".to_string(),
            "dry-run: watermark gnews -> 2024-11-13T08:00:00+00:00".to_string(),
        ]
    );
}

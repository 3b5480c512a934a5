mod jobs;
mod schedule;

use ainews_core::SourceKind;
use ainews_ingest::ListingKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ainews-cli")]
#[command(about = "AI news ingest command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingest job per selected source.
    Scrape {
        #[arg(value_enum)]
        target: Target,
        /// Per-key cap on examined and persisted items (defaults per source).
        #[arg(long)]
        limit: Option<usize>,
        /// Ignore stored watermarks and consider every item.
        #[arg(long)]
        full: bool,
        /// NewsAPI page size.
        #[arg(long)]
        page_size: Option<usize>,
        /// Reddit listing to read.
        #[arg(long, default_value = "new")]
        listing: ListingKind,
        /// Write to an in-memory store instead of Postgres.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print every stored watermark.
    Watermarks,
    /// Apply pending database migrations.
    Migrate,
    /// Run the daily ingest schedule until interrupted.
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Reddit,
    Newsapi,
    Gnews,
    All,
}

impl Target {
    fn sources(self) -> &'static [SourceKind] {
        match self {
            Target::Reddit => &[SourceKind::Reddit],
            Target::Newsapi => &[SourceKind::NewsApi],
            Target::Gnews => &[SourceKind::GoogleNews],
            Target::All => &SourceKind::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ainews_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Scrape {
            target,
            limit,
            full,
            page_size,
            listing,
            dry_run,
        }) => {
            let options = jobs::ScrapeOptions {
                limit,
                incremental: !full,
                page_size,
                listing,
                dry_run,
            };
            jobs::run_scrape(&config, target.sources(), options).await?;
        }
        Some(Commands::Watermarks) => {
            let pool = connect(&config).await?;
            let rows = ainews_db::list_watermarks(&pool).await?;
            if rows.is_empty() {
                println!("no watermarks stored");
            }
            for row in rows {
                let scope = if row.scope.is_empty() {
                    "-"
                } else {
                    row.scope.as_str()
                };
                println!(
                    "{:<8} {:<24} {}",
                    row.source,
                    scope,
                    row.last_seen_at.to_rfc3339()
                );
            }
            pool.close().await;
        }
        Some(Commands::Migrate) => {
            let pool = connect(&config).await?;
            let applied = ainews_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            pool.close().await;
        }
        Some(Commands::Schedule) => schedule::run_daemon(config).await?,
        None => println!("ainews-cli ready; run with --help for commands"),
    }

    Ok(())
}

async fn connect(config: &ainews_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = ainews_db::PoolConfig::from_app_config(config);
    let pool = ainews_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;

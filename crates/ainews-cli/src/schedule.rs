//! Daily ingest daemon.
//!
//! Registers one cron job per source on a [`JobScheduler`]. A failed job is
//! retried up to [`MAX_RETRIES`] times, [`RETRY_DELAY`] apart.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ainews_core::{AppConfig, SourceKind};
use ainews_db::PgConnector;
use ainews_ingest::ListingKind;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs;

/// Every day at 00:00 UTC.
pub(crate) const DAILY: &str = "0 0 0 * * *";
pub(crate) const MAX_RETRIES: u32 = 2;
pub(crate) const RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

/// Builds and starts the scheduler with the three daily ingest jobs.
///
/// The returned handle must be kept alive; dropping it stops the jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, a job
/// cannot be registered, or the scheduler fails to start.
pub(crate) async fn build_scheduler(
    connector: Arc<PgConnector>,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for source in SourceKind::ALL {
        register_ingest_job(
            &scheduler,
            source,
            Arc::clone(&connector),
            Arc::clone(&config),
        )
        .await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_ingest_job(
    scheduler: &JobScheduler,
    source: SourceKind,
    connector: Arc<PgConnector>,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(DAILY, move |_uuid, _lock| {
        let connector = Arc::clone(&connector);
        let config = Arc::clone(&config);

        Box::pin(async move {
            let params = jobs::fetch_params(source, None, true, None);
            tracing::info!(%source, limit = params.limit, "scheduler: starting daily run");

            let outcome = run_with_retries(source, MAX_RETRIES, RETRY_DELAY, || {
                jobs::run_source(
                    connector.as_ref(),
                    config.as_ref(),
                    source,
                    ListingKind::New,
                    &params,
                )
            })
            .await;

            match outcome {
                Some(report) => {
                    tracing::info!(%source, %report, "scheduler: daily run complete");
                }
                None => tracing::error!(%source, "scheduler: daily run gave up"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(%source, cron = DAILY, "scheduler: registered ingest job");
    Ok(())
}

/// Run `attempt` once, then up to `max_retries` more times while it fails.
///
/// Returns `None` when every attempt failed.
pub(crate) async fn run_with_retries<T, F, Fut>(
    source: SourceKind,
    max_retries: u32,
    delay: Duration,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Ok(value) => return Some(value),
            Err(e) if tries <= max_retries => {
                tracing::warn!(
                    %source,
                    attempt = tries,
                    error = %format!("{e:#}"),
                    "scheduler: job failed, retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    %source,
                    attempt = tries,
                    error = %format!("{e:#}"),
                    "scheduler: job failed"
                );
                return None;
            }
        }
    }
}

/// Start the scheduler and block until ctrl-c.
///
/// # Errors
///
/// Returns an error if the scheduler cannot start or shut down.
pub(crate) async fn run_daemon(config: AppConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let connector = Arc::new(PgConnector::from_app_config(&config));

    let mut scheduler = build_scheduler(connector, Arc::clone(&config)).await?;
    println!("scheduler running ({DAILY} UTC); press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

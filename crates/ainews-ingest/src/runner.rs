//! Job runner: one store connection per adapter invocation.

use ainews_core::StoreConnector;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::types::{FetchParams, FetchReport};

/// Connect, run `adapter` once, and disconnect on every exit path.
///
/// The invocation runs inside a `tracing` span carrying a fresh run id.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if the connection cannot be opened, or the
/// adapter's own fatal error after the connection has been released.
pub async fn run_job<C>(
    connector: &C,
    adapter: &dyn SourceAdapter,
    params: &FetchParams,
) -> Result<FetchReport, IngestError>
where
    C: StoreConnector,
{
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("ingest_job", %run_id, source = %adapter.source());

    async move {
        tracing::info!(
            limit = params.limit,
            incremental = params.incremental,
            "job started"
        );

        let store = match connector.connect().await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "store connection failed");
                return Err(IngestError::Store(e));
            }
        };
        let result = adapter.fetch(&store, params).await;
        connector.disconnect(store).await;

        match &result {
            Ok(report) => tracing::info!(persisted = report.persisted, %report, "job finished"),
            Err(e) => tracing::error!(error = %e, "job failed"),
        }
        result
    }
    .instrument(span)
    .await
}

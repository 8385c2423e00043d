use std::future::Future;

use tokio::time::timeout;
use tracing::warn;

use crate::{AppError, AppState};

/// Runs one collaborator RPC under the configured deadline.
/// Both transport errors and timeouts surface as `UpstreamUnavailable`.
pub(crate) async fn call_upstream<T, F>(state: &AppState, operation: &str, call: F) -> Result<T, AppError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let deadline = state.rpc_timeout();
    match timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            warn!(operation, error = %err, "upstream call failed");
            state.metrics.record_upstream_error();
            Err(AppError::UpstreamUnavailable(err))
        }
        Err(_) => {
            warn!(operation, timeout_ms = deadline.as_millis() as u64, "upstream call timed out");
            state.metrics.record_upstream_error();
            Err(AppError::UpstreamUnavailable(anyhow::anyhow!(
                "{} timed out after {}ms",
                operation,
                deadline.as_millis()
            )))
        }
    }
}

pub(crate) fn storage_error(state: &AppState, operation: &str, err: anyhow::Error) -> AppError {
    tracing::error!(operation, error = %err, "storage operation failed");
    state.metrics.record_storage_error();
    AppError::Storage(err)
}

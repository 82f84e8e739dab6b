//! Per-operation deadlines for datastore calls.

use std::future::Future;
use std::time::Duration;

use crate::db::RepositoryError;

/// Run `fut`, failing with `RepositoryError::Timeout` if it takes longer
/// than `limit`.
///
/// The future is dropped on expiry; for `PostgreSQL` that rolls back any
/// open transaction.
///
/// # Errors
///
/// Returns the future's own error, or the timeout converted into `E`.
pub async fn with_deadline<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<RepositoryError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?limit, "Datastore operation exceeded its deadline");
            Err(RepositoryError::Timeout.into())
        }
    }
}

//! Health check functionality module.
//!
//! This module provides:
//! - Storage backend checks
//! - Readiness checks used by `/health/ready`
//! - A background recorder exporting check results as metrics

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::storage::VocabularyStore;

/// Interval between background health checks
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Perform readiness checks
pub async fn perform_readiness_checks(store: &dyn VocabularyStore) -> Result<()> {
    check_storage_health(store).await
}

/// Check that the storage backend can serve requests
pub async fn check_storage_health(store: &dyn VocabularyStore) -> Result<()> {
    store
        .health_check()
        .await
        .map_err(|e| anyhow::anyhow!("{} storage health check failed: {}", store.backend_name(), e))?;

    tracing::debug!(backend = store.backend_name(), "Storage health check passed");
    Ok(())
}

/// Start a background task to periodically record health check metrics
pub fn start_health_metrics_recorder(
    store: Arc<dyn VocabularyStore>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);

        loop {
            interval.tick().await;

            let check_start = Instant::now();
            let healthy = check_storage_health(store.as_ref()).await.is_ok();
            crate::observability::metrics::record_health_check_metrics(
                "storage",
                healthy,
                check_start.elapsed(),
            );
        }
    })
}

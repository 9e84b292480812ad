//! Periodic removal of expired refresh-token records.
//!
//! Expired records can never be used again, so deleting them only bounds
//! table growth. Revoked but unexpired records are kept until they expire.

use std::sync::Arc;
use std::time::Duration;

use laurel_core::clock::Clock;
use laurel_db::store::RefreshTokenStore;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop until `cancel` is triggered. The first sweep happens
/// immediately.
pub async fn run(
    store: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Refresh token sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Refresh token sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match store.sweep(clock.now()).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Refresh token sweep: purged expired records");
                    }
                    Ok(_) => {
                        tracing::debug!("Refresh token sweep: nothing to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Refresh token sweep failed");
                    }
                }
            }
        }
    }
}

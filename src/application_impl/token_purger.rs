use crate::application_port::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically drops refresh records that can no longer be used.
pub struct TokenPurger {
    token_store: Arc<dyn TokenStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl TokenPurger {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            token_store,
            interval: interval.max(MIN_INTERVAL),
            cancellation_token,
        }
    }

    pub async fn purge_once(&self) -> Result<u64, AuthError> {
        let purged = self.token_store.purge_expired(Utc::now()).await?;
        if purged > 0 {
            tracing::info!(purged, "expired refresh records removed");
        }
        Ok(purged)
    }

    /// Purges immediately, then once per interval until cancelled.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("TokenPurger shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.purge_once().await {
                        tracing::error!("TokenPurger error: {e}");
                    }
                }
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion scheduling.
//!
//! Runs a [`MessageFetcher`] on a fixed interval until cancelled. Fetch
//! failures are logged and retried on the next tick; the source must never
//! take the daemon down.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use adwatch_core::MessageFetcher;

/// Drives `fetcher` once per `interval` until `cancel` fires.
///
/// The first tick runs after one full interval, matching the "poll the
/// source every N seconds" contract rather than fetching at startup.
pub async fn run_fetch_loop(
    fetcher: Arc<dyn MessageFetcher>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the immediate first tick.
    ticker.tick().await;

    info!(
        fetcher = fetcher.name(),
        interval_secs = interval.as_secs(),
        "ingestion loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match fetcher.fetch().await {
                    Ok(stats) => {
                        debug!(
                            fetcher = fetcher.name(),
                            fetched = stats.fetched,
                            inserted = stats.inserted,
                            "ingestion pass complete"
                        );
                    }
                    Err(e) => {
                        warn!(
                            fetcher = fetcher.name(),
                            error = %e,
                            "ingestion pass failed, retrying next tick"
                        );
                    }
                }
            }
            _ = cancel.cancelled() => {
                info!(fetcher = fetcher.name(), "ingestion loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwatch_core::types::FetchStats;
    use adwatch_core::AdwatchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingFetcher {
        calls: AtomicU64,
        fail: bool,
    }

    #[async_trait]
    impl MessageFetcher for CountingFetcher {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self) -> Result<FetchStats, AdwatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AdwatchError::Internal("source unreachable".into()))
            } else {
                Ok(FetchStats {
                    fetched: 3,
                    inserted: 1,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_once_per_interval() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicU64::new(0),
            fail: false,
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_fetch_loop(
            fetcher.clone(),
            Duration::from_secs(30),
            cancel.clone(),
        ));
        // Let the loop register its interval timer before advancing time.
        tokio::task::yield_now().await;

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(30)).await;
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_does_not_stop_the_loop() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicU64::new(0),
            fail: true,
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_fetch_loop(
            fetcher.clone(),
            Duration::from_secs(30),
            cancel.clone(),
        ));
        // Let the loop register its interval timer before advancing time.
        tokio::task::yield_now().await;

        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(30)).await;
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(fetcher.calls.load(Ordering::SeqCst) >= 2);
    }
}

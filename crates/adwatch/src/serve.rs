// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `adwatch serve` command implementation.
//!
//! Starts the notification daemon: SQLite repository, event bus, and the
//! engine loop on its own task so presentation work is never blocked by
//! engine I/O. Supports graceful shutdown via signal handlers: stop the
//! engine, drain the bus, checkpoint the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use adwatch_bus::{Event, EventBus, EventHandler, EventType};
use adwatch_config::AdwatchConfig;
use adwatch_core::{AdwatchError, Repository};
use adwatch_engine::{shutdown, NotificationEngine};
use adwatch_storage::SqliteRepository;

/// Runs the `adwatch serve` command.
pub async fn run_serve(config: AdwatchConfig) -> Result<(), AdwatchError> {
    init_tracing(&config.daemon.log_level);

    info!("starting adwatch serve");

    // Initialize storage.
    let repo: Arc<dyn Repository> = {
        let repo = SqliteRepository::new(config.storage.clone());
        repo.initialize().await?;
        Arc::new(repo)
    };

    // Wire the bus. The log sink keeps every event observable until a real
    // presentation collaborator subscribes alongside it.
    let bus = Arc::new(EventBus::new());
    bus.subscribe(
        &[
            EventType::SubscriberDataUpdated,
            EventType::SubscriberIdle,
            EventType::DeliveryRequested,
            EventType::CriticalError,
            EventType::EngineStopped,
        ],
        Arc::new(EventLogSink),
    )
    .await?;

    let engine = Arc::new(NotificationEngine::new(
        repo.clone(),
        bus.clone(),
        config.engine.clone(),
    ));

    // Install signal handler and tie it to the engine's token.
    let cancel = shutdown::install_signal_handler();
    {
        let engine_cancel = engine.cancel_token();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            engine_cancel.cancel();
        });
    }

    // No chat-platform fetcher is compiled into this binary; ingestion goes
    // through the engine's AddMessage mutation. An external collaborator can
    // be scheduled with `adwatch_engine::fetch::run_fetch_loop` at
    // `fetcher.poll_interval_secs` granularity.
    info!(
        poll_interval_secs = config.fetcher.poll_interval_secs,
        "no message fetcher configured, ingestion via mutation API only"
    );

    // Run the engine on its own worker task.
    let engine_task = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run().await })
    };

    // Wait for shutdown, then drain in dependency order.
    cancel.cancelled().await;
    engine.stop().await;
    match engine_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "engine exited with error"),
        Err(e) => error!(error = %e, "engine task join failed"),
    }

    let drain_timeout = Duration::from_secs(config.daemon.shutdown_timeout_secs);
    if let Err(e) = bus.drain_pending(drain_timeout).await {
        warn!(error = %e, "event handlers abandoned at shutdown");
    }
    repo.close().await?;

    info!("adwatch serve shutdown complete");
    Ok(())
}

/// Minimal presentation stand-in: logs every engine event.
struct EventLogSink;

#[async_trait]
impl EventHandler for EventLogSink {
    fn name(&self) -> &str {
        "event-log"
    }

    async fn handle(&self, event: Event) -> Result<(), AdwatchError> {
        match event {
            Event::DeliveryRequested {
                subscriber_id,
                external_id,
                url,
                ..
            } => info!(subscriber_id, external_id, url = url.as_str(), "delivery requested"),
            Event::SubscriberIdle { subscriber_id } => {
                info!(subscriber_id, "subscriber idle, console close requested")
            }
            Event::SubscriberDataUpdated { subscriber_id } => {
                info!(subscriber_id, "subscriber data updated")
            }
            Event::CriticalError { message } => {
                error!(message = message.as_str(), "engine critical error")
            }
            Event::EngineStopped => info!("engine stopped"),
        }
        Ok(())
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("adwatch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

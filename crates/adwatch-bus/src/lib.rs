// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process publish/subscribe dispatcher for engine events.
//!
//! The bus is fire-and-forget: [`EventBus::publish`] spawns one task per
//! matching handler and returns immediately. Handlers never run under the
//! bus lock, so a slow or failing handler cannot block sibling handlers or
//! later publishes. The only serialized section is the bus's own bookkeeping:
//! the registration list and the in-flight task set consulted by
//! [`EventBus::drain_pending`] during orderly shutdown.

pub mod events;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use adwatch_core::AdwatchError;

pub use events::{Event, EventType};

/// A subscriber-side callback for bus events.
///
/// One handler may register for several event types. The `name` identifies
/// the handler for duplicate-registration rejection and log context.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: Event) -> Result<(), AdwatchError>;
}

struct Registration {
    name: String,
    types: HashSet<EventType>,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct BusInner {
    registrations: Vec<Registration>,
    in_flight: Vec<JoinHandle<()>>,
}

/// The in-process event bus. No persistence, no network.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the given event types.
    ///
    /// Returns [`AdwatchError::Bus`] for an empty type set or a handler name
    /// that is already registered. Both are wiring-time mistakes; the error
    /// is non-fatal and the bus state is unchanged.
    pub async fn subscribe(
        &self,
        types: &[EventType],
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), AdwatchError> {
        if types.is_empty() {
            return Err(AdwatchError::Bus(format!(
                "handler `{}` subscribed to an empty event type set",
                handler.name()
            )));
        }

        let mut inner = self.inner.lock().await;
        if inner.registrations.iter().any(|r| r.name == handler.name()) {
            return Err(AdwatchError::Bus(format!(
                "duplicate handler: `{}` is already registered",
                handler.name()
            )));
        }

        debug!(
            handler = handler.name(),
            types = ?types,
            "handler subscribed"
        );
        inner.registrations.push(Registration {
            name: handler.name().to_string(),
            types: types.iter().copied().collect(),
            handler,
        });
        Ok(())
    }

    /// Publishes `event` to every handler registered for its type.
    ///
    /// Each matching handler runs as its own spawned task; a handler error is
    /// logged and isolated. An event with no matching handler is a
    /// recoverable condition and is logged, not returned as an error.
    pub async fn publish(&self, event: Event) {
        let event_type = event.event_type();
        let mut inner = self.inner.lock().await;

        // Reap completed invocations so the in-flight set stays bounded.
        inner.in_flight.retain(|h| !h.is_finished());

        let mut dispatched = 0usize;
        let matched: Vec<(String, Arc<dyn EventHandler>)> = inner
            .registrations
            .iter()
            .filter(|r| r.types.contains(&event_type))
            .map(|r| (r.name.clone(), r.handler.clone()))
            .collect();

        for (name, handler) in matched {
            let event = event.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = handler.handle(event).await {
                    error!(handler = name.as_str(), error = %e, "event handler failed");
                }
            });
            inner.in_flight.push(handle);
            dispatched += 1;
        }

        if dispatched == 0 {
            warn!(event = %event_type, "no handler registered for event");
        } else {
            debug!(event = %event_type, handlers = dispatched, "event dispatched");
        }
    }

    /// Waits up to `timeout` for every dispatched-but-incomplete handler
    /// invocation to finish. Stragglers are aborted and a timeout error is
    /// returned. Used only during orderly shutdown.
    pub async fn drain_pending(&self, timeout: Duration) -> Result<(), AdwatchError> {
        let handles: Vec<JoinHandle<()>> = {
            let mut inner = self.inner.lock().await;
            inner.in_flight.drain(..).collect()
        };
        if handles.is_empty() {
            return Ok(());
        }

        debug!(pending = handles.len(), "draining in-flight handlers");
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        match tokio::time::timeout(timeout, futures::future::join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        if e.is_panic() {
                            error!(error = %e, "event handler panicked");
                        }
                    }
                }
                Ok(())
            }
            Err(_) => {
                for abort in aborts {
                    abort.abort();
                }
                error!(?timeout, "handlers still pending at drain timeout, aborted");
                Err(AdwatchError::Timeout { duration: timeout })
            }
        }
    }

    /// Number of dispatched handler invocations not yet reaped.
    pub async fn in_flight_len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.in_flight.retain(|h| !h.is_finished());
        inner.in_flight.len()
    }
}

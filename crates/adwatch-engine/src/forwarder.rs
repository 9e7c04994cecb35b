// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue-drain pass.
//!
//! For every forwarding-enabled subscriber, walks a FIFO snapshot of their
//! queue and publishes one `DeliveryRequested` per entry while the console is
//! closed. Delivered entries are removed in a single transaction after the
//! walk. Delivery while the console is open is suspended so a live
//! notification never interleaves with an open editing session.

use std::sync::Arc;

use tracing::{debug, warn};

use adwatch_bus::{Event, EventBus};
use adwatch_core::types::ForwardTarget;
use adwatch_core::{AdwatchError, Repository};

use crate::activity::ActivityTracker;

/// Drains per-subscriber forward queues into delivery events.
pub struct ForwardQueueManager {
    repo: Arc<dyn Repository>,
    bus: Arc<EventBus>,
    activity: Arc<ActivityTracker>,
}

impl ForwardQueueManager {
    pub fn new(
        repo: Arc<dyn Repository>,
        bus: Arc<EventBus>,
        activity: Arc<ActivityTracker>,
    ) -> Self {
        Self {
            repo,
            bus,
            activity,
        }
    }

    /// One drain pass over every forwarding-enabled subscriber.
    ///
    /// A storage failure on one subscriber's queue is logged and must not
    /// starve the other queues; their entries stay put and are retried next
    /// cycle.
    pub async fn drain(&self) -> Result<(), AdwatchError> {
        let targets = self.repo.forwarding_subscribers().await?;
        for target in targets {
            if let Err(e) = self.drain_subscriber(target).await {
                warn!(
                    subscriber_id = target.id,
                    error = %e,
                    "queue drain failed, entries retried next cycle"
                );
            }
        }
        Ok(())
    }

    async fn drain_subscriber(&self, target: ForwardTarget) -> Result<(), AdwatchError> {
        let snapshot = self.repo.queued_messages(target.id).await?;
        if snapshot.is_empty() {
            return Ok(());
        }

        let mut delivered = Vec::new();
        for entry in snapshot {
            // Re-checked per entry: if the console opens mid-batch the walk
            // stops, so later entries are never reordered past a suppressed
            // earlier one.
            if self.activity.is_menu_open(target.id) {
                debug!(
                    subscriber_id = target.id,
                    remaining = delivered.len(),
                    "console open, delivery suspended"
                );
                break;
            }
            self.bus
                .publish(Event::DeliveryRequested {
                    subscriber_id: target.id,
                    external_id: target.external_id,
                    url: entry.url,
                    text: entry.text,
                })
                .await;
            delivered.push(entry.message_id);
        }

        if delivered.is_empty() {
            return Ok(());
        }
        match self.repo.remove_queued(target.id, &delivered).await {
            Ok(()) => {
                debug!(
                    subscriber_id = target.id,
                    count = delivered.len(),
                    "queue entries delivered and removed"
                );
                Ok(())
            }
            Err(e) => {
                // The delivery events are already out; with the removal
                // rolled back these entries will be re-published next cycle.
                warn!(
                    subscriber_id = target.id,
                    count = delivered.len(),
                    error = %e,
                    "queue removal rolled back after publish, entries may be redelivered"
                );
                Err(e)
            }
        }
    }
}

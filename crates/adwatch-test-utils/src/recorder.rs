// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording event handler standing in for the presentation layer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use adwatch_bus::{Event, EventHandler, EventType};
use adwatch_core::AdwatchError;

/// Captures every event it receives for later assertion.
pub struct RecordingHandler {
    name: String,
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            events: Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of everything recorded so far.
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    /// Recorded events of one type, in arrival order.
    pub async fn events_of(&self, event_type: EventType) -> Vec<Event> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    /// Number of recorded events of one type.
    pub async fn count_of(&self, event_type: EventType) -> usize {
        self.events_of(event_type).await.len()
    }

    /// Drop everything recorded so far.
    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: Event) -> Result<(), AdwatchError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_filters_by_type() {
        let recorder = RecordingHandler::new("recorder");
        recorder
            .handle(Event::SubscriberIdle { subscriber_id: 1 })
            .await
            .unwrap();
        recorder.handle(Event::EngineStopped).await.unwrap();

        assert_eq!(recorder.events().await.len(), 2);
        assert_eq!(recorder.count_of(EventType::SubscriberIdle).await, 1);
        assert_eq!(recorder.count_of(EventType::DeliveryRequested).await, 0);

        recorder.clear().await;
        assert!(recorder.events().await.is_empty());
    }
}

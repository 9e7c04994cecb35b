// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed event set carried by the bus.
//!
//! Handlers register against the field-less [`EventType`] enum; the payloads
//! travel as [`Event`] variants. Keeping the set closed means an unrecognized
//! event type is unrepresentable rather than a runtime error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An event published by the notification engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A subscriber's queue or settings changed while their console is open;
    /// the presentation layer should refresh its view.
    SubscriberDataUpdated { subscriber_id: i64 },

    /// A subscriber's console has been open past the idle threshold; the
    /// presentation layer is expected to force-close it.
    SubscriberIdle { subscriber_id: i64 },

    /// A queued message is ready for delivery to a subscriber.
    DeliveryRequested {
        subscriber_id: i64,
        external_id: i64,
        url: String,
        text: String,
    },

    /// The engine observed repeated failures it could not absorb silently.
    CriticalError { message: String },

    /// The engine loop has exited.
    EngineStopped,
}

/// Registration key for [`Event`] variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum EventType {
    SubscriberDataUpdated,
    SubscriberIdle,
    DeliveryRequested,
    CriticalError,
    EngineStopped,
}

impl Event {
    /// The registration key this event dispatches under.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::SubscriberDataUpdated { .. } => EventType::SubscriberDataUpdated,
            Event::SubscriberIdle { .. } => EventType::SubscriberIdle,
            Event::DeliveryRequested { .. } => EventType::DeliveryRequested,
            Event::CriticalError { .. } => EventType::CriticalError,
            Event::EngineStopped => EventType::EngineStopped,
        }
    }
}

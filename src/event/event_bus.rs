// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-out channel for coordinator lifecycle events.

use tokio::sync::broadcast;

use super::CoordinatorEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts [`CoordinatorEvent`]s from the polling coordinators to any
/// number of listeners.
///
/// Listeners typically react to device churn (add or remove platform
/// entities) and to [`CoordinatorEvent::AuthRequired`] (trigger a
/// reauthentication flow). Every listener observes every event published
/// after its subscription; there is no replay of earlier events.
///
/// Backed by a bounded tokio broadcast channel of 256 events. A listener
/// that falls that far behind sees `RecvError::Lagged` and resumes from
/// the oldest retained event.
///
/// # Examples
///
/// ```
/// use petkit_lib::device::DeviceId;
/// use petkit_lib::event::{CoordinatorEvent, EventBus};
///
/// let bus = EventBus::new();
/// let _churn = bus.subscribe();
///
/// bus.publish(CoordinatorEvent::device_discovered(DeviceId::new(1)));
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Builds a bus with a custom buffer size, for listeners that drain
    /// slowly or in bursts.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new event stream starting from the next published event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.sender.subscribe()
    }

    /// Number of streams currently open.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends an event to every open stream.
    ///
    /// Publishing with nobody listening is a no-op, which lets the
    /// coordinators emit unconditionally.
    pub fn publish(&self, event: CoordinatorEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

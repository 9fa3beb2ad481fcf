// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for coordinator notifications.
//!
//! This module provides a pub/sub event system for notifying subscribers
//! about device churn, refresh outcomes and polling cadence changes. The
//! [`EventBus`] uses tokio's broadcast channel to allow multiple subscribers
//! to receive events.
//!
//! # Examples
//!
//! ```
//! use petkit_lib::device::DeviceId;
//! use petkit_lib::event::{CoordinatorEvent, EventBus};
//!
//! let bus = EventBus::new();
//!
//! // Subscribe to events
//! let mut rx = bus.subscribe();
//!
//! // Publish an event
//! bus.publish(CoordinatorEvent::device_discovered(DeviceId::new(1)));
//! ```

mod coordinator_event;
mod event_bus;

pub use coordinator_event::CoordinatorEvent;
pub use event_bus::EventBus;

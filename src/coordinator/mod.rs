// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background coordinators.
//!
//! Three cooperating coordinators keep the integration fresh:
//!
//! - [`DataCoordinator`] polls the cloud for device state, tracks device
//!   churn and adapts its cadence after actionable commands.
//! - [`MediaCoordinator`] mirrors event media into the local disk cache and
//!   applies the retention window.
//! - [`BluetoothCoordinator`] opens periodic BLE relay sessions so water
//!   fountains sync their cloud state.
//!
//! The data coordinator is the hub: it owns the event bus and the device
//! snapshot channel, and hands each successful refresh to the media worker
//! over an unbounded queue.

mod bluetooth;
mod data;
mod media;
mod polling;

pub use bluetooth::BluetoothCoordinator;
pub use data::{DataCoordinator, DeviceSnapshot};
pub use media::MediaCoordinator;
pub use polling::{PollTransition, PollingState, RefreshBackoff};

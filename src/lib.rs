// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PetKit` Lib - coordination core for PetKit smart pet devices.
//!
//! This library keeps a fleet of PetKit devices (feeders, litter boxes,
//! water fountains, purifiers and pet profiles) fresh for a smart-home
//! host: it polls the cloud, tracks device churn, mirrors event media to
//! disk, nudges water fountains over a Bluetooth relay, and derives the
//! entity set of each device from static descriptor tables.
//!
//! The cloud transport, media decryption, BLE hardware and host registry
//! are all injected through traits in [`client`]; this crate ships no
//! network or Bluetooth code of its own.
//!
//! # Coordinators
//!
//! - [`DataCoordinator`]: adaptive device-state polling with fast-poll
//!   escalation after actionable commands, stale-device registry pruning
//!   and a broadcast event bus.
//! - [`MediaCoordinator`]: downloads missing event media, keeps a table of
//!   cached files and prunes date directories past the retention window.
//! - [`BluetoothCoordinator`]: periodic short BLE sessions so water
//!   fountains sync their cloud state.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use petkit_lib::{
//!     build_entities, DataCoordinator, DescriptorRegistry, PetkitOptions,
//! };
//! # use petkit_lib::client::{CloudClient, DeviceRegistry};
//!
//! # async fn example(
//! #     client: Arc<dyn CloudClient>,
//! #     registry: Arc<dyn DeviceRegistry>,
//! # ) -> petkit_lib::Result<()> {
//! let options = PetkitOptions::default().with_scan_interval_secs(30);
//! let coordinator = Arc::new(DataCoordinator::new(
//!     Arc::clone(&client),
//!     registry,
//!     options,
//!     "entry-1",
//! ));
//!
//! // First refresh, then build entities from what the devices support
//! coordinator.refresh().await?;
//! let descriptors = DescriptorRegistry::new();
//! let entities = build_entities(&coordinator, &client, &descriptors);
//!
//! // Hand the polling loop to the runtime
//! let handle = DataCoordinator::spawn(Arc::clone(&coordinator));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod descriptor;
pub mod device;
mod entity;
pub mod error;
pub mod event;

pub use client::{ApiCommand, BleRelay, CloudClient, DOMAIN, DeviceRegistry, MediaFetcher};
pub use config::PetkitOptions;
pub use coordinator::{
    BluetoothCoordinator, DataCoordinator, DeviceSnapshot, MediaCoordinator, PollingState,
};
pub use descriptor::{CommandInput, DescriptorRegistry, EntityDescriptor, Platform, StateValue};
pub use device::{Device, DeviceId, DeviceKind, MediaFile, MediaRecord, MediaType, RecordType};
pub use entity::{Entity, build_entities};
pub use error::{ClientError, Error, MediaError, RefreshError, Result};
pub use event::{CoordinatorEvent, EventBus};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External collaborator seams.
//!
//! The cloud client, media download helper, Bluetooth relay and host device
//! registry are all out of scope for this library. They are consumed through
//! the traits in this module and injected at coordinator construction, so
//! tests can substitute scripted fakes and hosts can plug in their own
//! implementations.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::device::{Device, DeviceId, MediaFile, MediaRecord};
use crate::error::ClientError;

/// A control action sent to a device through the cloud.
///
/// Commands are fire-and-forget: the cloud acknowledges receipt, and the
/// resulting state change shows up in a later poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCommand {
    /// Cloud endpoint name (e.g. `updateSettings`, `manualFeed`).
    pub action: String,
    /// JSON payload for the action.
    pub payload: Value,
}

impl ApiCommand {
    /// Creates a new command.
    #[must_use]
    pub fn new(action: impl Into<String>, payload: Value) -> Self {
        Self {
            action: action.into(),
            payload,
        }
    }
}

/// The external PetKit cloud client.
///
/// Responsible for transport, authentication and device parsing. The
/// library only drives its refresh cycle and reads the parsed entity map.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Fetches fresh state for all account devices into the client's
    /// internal entity map.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`]; session/auth/region variants are
    /// classified as authentication failures by the coordinator.
    async fn get_devices_data(&self) -> Result<(), ClientError>;

    /// Returns a snapshot of the client's parsed entity map.
    fn devices(&self) -> HashMap<DeviceId, Device>;

    /// Sends a fire-and-forget control action to a device.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the cloud rejects the request.
    async fn send_api_request(
        &self,
        device_id: DeviceId,
        command: ApiCommand,
    ) -> Result<(), ClientError>;
}

/// The external media download helper.
///
/// Owns the exact on-disk naming below the date directory level and the
/// decrypt-download of individual files. The missing-file diff itself is
/// computed by the media coordinator.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Lists the cached media files for a device under the given root.
    ///
    /// A missing device directory yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on filesystem failure.
    async fn disk_files(&self, root: &Path, device_id: DeviceId)
    -> Result<Vec<MediaFile>, ClientError>;

    /// Downloads and decrypts one media file into the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on download or decryption failure.
    async fn download(&self, root: &Path, record: &MediaRecord) -> Result<(), ClientError>;
}

/// The external Bluetooth relay.
///
/// Opens short-lived BLE sessions to water fountains so the cloud can read
/// attributes only reachable locally.
#[async_trait]
pub trait BleRelay: Send + Sync {
    /// Opens a BLE session to a device.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the session cannot be established.
    async fn open_ble_connection(&self, device_id: DeviceId) -> Result<(), ClientError>;

    /// Closes a previously opened BLE session.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the close handshake fails.
    async fn close_ble_connection(&self, device_id: DeviceId) -> Result<(), ClientError>;
}

/// Opaque handle to a host registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryEntryId(pub String);

/// The host device registry.
///
/// Lookups are scoped by integration domain so identifier collisions with
/// devices owned by other integrations never resolve here.
pub trait DeviceRegistry: Send + Sync {
    /// Looks up a registry entry by `(domain, device id)` identifier.
    fn device_by_identifier(&self, domain: &str, device_id: DeviceId) -> Option<RegistryEntryId>;

    /// Detaches a config entry from a registry entry.
    ///
    /// The host removes the device once no config entries reference it;
    /// devices referenced by other entries are left alone.
    fn remove_config_entry(&self, entry: &RegistryEntryId, config_entry_id: &str);
}

/// Integration domain used for registry identifier scoping.
pub const DOMAIN: &str = "petkit";

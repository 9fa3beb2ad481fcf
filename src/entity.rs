// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-facing entity wrapper.
//!
//! An [`Entity`] binds one descriptor to one device and renders its value
//! from whatever snapshot the data coordinator currently publishes. Writes
//! go through the cloud client; actionable commands arm fast polling and
//! request an immediate refresh so the state change lands quickly.

use std::sync::Arc;

use crate::client::CloudClient;
use crate::coordinator::DataCoordinator;
use crate::descriptor::{CommandInput, DescriptorRegistry, EntityDescriptor, StateValue};
use crate::device::{Device, DeviceId};
use crate::error::{Error, Result};

/// One entity exposed to the host.
#[derive(Clone)]
pub struct Entity {
    coordinator: Arc<DataCoordinator>,
    client: Arc<dyn CloudClient>,
    descriptor: EntityDescriptor,
    device_id: DeviceId,
    unique_id: String,
}

impl Entity {
    /// Creates an entity for a (device, descriptor) pair.
    ///
    /// The unique id is stable across restarts: device serial number plus
    /// descriptor key.
    #[must_use]
    pub fn new(
        coordinator: Arc<DataCoordinator>,
        client: Arc<dyn CloudClient>,
        descriptor: EntityDescriptor,
        device: &Device,
    ) -> Self {
        let unique_id = format!("{}_{}", device.sn, descriptor.key);
        Self {
            coordinator,
            client,
            descriptor,
            device_id: device.id,
            unique_id,
        }
    }

    /// Returns the stable unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the descriptor backing this entity.
    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Returns the device this entity belongs to.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Returns true while the device is present in the current snapshot.
    #[must_use]
    pub fn available(&self) -> bool {
        self.coordinator.devices().contains_key(&self.device_id)
    }

    /// Renders the current value from the latest snapshot.
    ///
    /// `None` when the device is gone from the snapshot, the descriptor has
    /// no value accessor, or the payload no longer carries the field.
    #[must_use]
    pub fn state(&self) -> Option<StateValue> {
        let snapshot = self.coordinator.devices();
        let device = snapshot.get(&self.device_id)?;
        (self.descriptor.value?)(device)
    }

    /// Sends a write action for this entity.
    ///
    /// After a successful dispatch of a fast-poll descriptor, accelerated
    /// polling is armed and an immediate refresh is requested.
    ///
    /// # Errors
    ///
    /// [`Error::ReadOnlyEntity`] when the descriptor carries no command,
    /// [`Error::DeviceNotFound`] when the device left the snapshot, a
    /// [`Error::Client`] when the input shape does not apply or the cloud
    /// rejects the request.
    pub async fn set_value(&self, input: CommandInput) -> Result<()> {
        let Some(build) = self.descriptor.command else {
            return Err(Error::ReadOnlyEntity);
        };

        let command = {
            let snapshot = self.coordinator.devices();
            let device = snapshot.get(&self.device_id).ok_or(Error::DeviceNotFound)?;
            build(device, &input).ok_or_else(|| {
                crate::error::ClientError::Library(format!(
                    "input {input:?} does not apply to '{}'",
                    self.descriptor.key
                ))
            })?
        };

        tracing::debug!(
            device_id = %self.device_id,
            key = self.descriptor.key,
            action = %command.action,
            "dispatching entity command"
        );
        self.client
            .send_api_request(self.device_id, command)
            .await
            .map_err(Error::Client)?;

        if self.descriptor.fast_poll {
            self.coordinator.enable_fast_polling_default();
            self.coordinator.request_refresh();
        }
        Ok(())
    }

    /// Triggers a stateless action (button press).
    ///
    /// # Errors
    ///
    /// Same as [`set_value`](Self::set_value).
    pub async fn press(&self) -> Result<()> {
        self.set_value(CommandInput::Press).await
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("unique_id", &self.unique_id)
            .field("platform", &self.descriptor.platform)
            .finish_non_exhaustive()
    }
}

/// Builds entities for every supported (device, descriptor) pair in the
/// coordinator's current snapshot.
///
/// Platform setup calls this once per platform after the first refresh.
#[must_use]
pub fn build_entities(
    coordinator: &Arc<DataCoordinator>,
    client: &Arc<dyn CloudClient>,
    registry: &DescriptorRegistry,
) -> Vec<Entity> {
    let snapshot = coordinator.devices();
    let mut entities = Vec::new();

    for device in snapshot.values() {
        for descriptor in registry.supported_for(device) {
            entities.push(Entity::new(
                Arc::clone(coordinator),
                Arc::clone(client),
                descriptor.clone(),
                device,
            ));
        }
    }

    tracing::debug!(count = entities.len(), "entities built from snapshot");
    entities
}

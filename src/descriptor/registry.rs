// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptor registry.

use std::collections::HashMap;

use crate::device::{Device, DeviceKind};

use super::{EntityDescriptor, binary_sensor, control, sensor};

/// All entity descriptors, grouped by device family.
///
/// Built once at setup; lookups never touch the tables again.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    tables: HashMap<DeviceKind, Vec<EntityDescriptor>>,
}

impl DescriptorRegistry {
    /// Builds the registry from the static platform tables.
    #[must_use]
    pub fn new() -> Self {
        let mut tables: HashMap<DeviceKind, Vec<EntityDescriptor>> = HashMap::new();

        let mut feeder = sensor::feeder();
        feeder.extend(binary_sensor::feeder());
        feeder.extend(control::feeder());
        tables.insert(DeviceKind::Feeder, feeder);

        let mut litter = sensor::litter();
        litter.extend(binary_sensor::litter());
        litter.extend(control::litter());
        tables.insert(DeviceKind::Litter, litter);

        let mut fountain = sensor::water_fountain();
        fountain.extend(binary_sensor::water_fountain());
        fountain.extend(control::water_fountain());
        tables.insert(DeviceKind::WaterFountain, fountain);

        let mut purifier = sensor::purifier();
        purifier.extend(control::purifier());
        tables.insert(DeviceKind::Purifier, purifier);

        tables.insert(DeviceKind::Pet, sensor::pet());

        Self { tables }
    }

    /// Returns all descriptors for a device family.
    #[must_use]
    pub fn descriptors_for(&self, kind: DeviceKind) -> &[EntityDescriptor] {
        self.tables.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Looks up one descriptor by family and key.
    ///
    /// When a key has type-specialized variants the first one is returned;
    /// use [`supported_for`](Self::supported_for) for per-device resolution.
    #[must_use]
    pub fn get(&self, kind: DeviceKind, key: &str) -> Option<&EntityDescriptor> {
        self.descriptors_for(kind)
            .iter()
            .find(|descriptor| descriptor.key == key)
    }

    /// Returns the descriptors applicable to a concrete device.
    ///
    /// Devices with an unrecognized type tag get no entities.
    #[must_use]
    pub fn supported_for(&self, device: &Device) -> Vec<&EntityDescriptor> {
        let Some(kind) = device.kind() else {
            tracing::debug!(tag = %device.type_tag(), "unrecognized device type");
            return Vec::new();
        };

        self.descriptors_for(kind)
            .iter()
            .filter(|descriptor| descriptor.is_supported(device))
            .collect()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;
    use serde_json::json;

    #[test]
    fn every_family_has_a_table() {
        let registry = DescriptorRegistry::new();

        assert!(!registry.descriptors_for(DeviceKind::Feeder).is_empty());
        assert!(!registry.descriptors_for(DeviceKind::Litter).is_empty());
        assert!(!registry.descriptors_for(DeviceKind::WaterFountain).is_empty());
        assert!(!registry.descriptors_for(DeviceKind::Pet).is_empty());
        assert!(!registry.descriptors_for(DeviceKind::Purifier).is_empty());
    }

    #[test]
    fn purifier_exposes_power_mode_and_readings() {
        let registry = DescriptorRegistry::new();
        let device = Device::new(DeviceId::new(3), "SN3", "Purifier", "k2").with_state(json!({
            "state": {"power": 1, "mode": 0, "humidity": 553, "temp": 218, "wifi": {"rsq": -55}},
        }));

        let keys: Vec<_> = registry
            .supported_for(&device)
            .iter()
            .map(|d| d.key)
            .collect();

        assert!(keys.contains(&"power"));
        assert!(keys.contains(&"purifier_mode"));
        assert!(keys.contains(&"humidity"));
        assert!(keys.contains(&"temperature"));
        assert!(keys.contains(&"rssi"));
    }

    #[test]
    fn lookup_by_key() {
        let registry = DescriptorRegistry::new();
        let descriptor = registry.get(DeviceKind::Feeder, "device_status").unwrap();
        assert_eq!(descriptor.key, "device_status");

        assert!(registry.get(DeviceKind::Feeder, "no_such_key").is_none());
    }

    #[test]
    fn supported_set_follows_payload_shape() {
        let registry = DescriptorRegistry::new();

        let rich = Device::new(DeviceId::new(1), "SN1", "Feeder", "d4").with_state(json!({
            "state": {"pim": 1, "desiccantLeftDays": 12, "wifi": {"rsq": -60}},
            "settings": {"lightMode": 1, "manualLock": 0, "surplus": 2},
        }));
        let bare = Device::new(DeviceId::new(2), "SN2", "Feeder", "d4")
            .with_state(json!({"state": {"pim": 1}}));

        let rich_keys: Vec<_> = registry
            .supported_for(&rich)
            .iter()
            .map(|d| d.key)
            .collect();
        let bare_keys: Vec<_> = registry
            .supported_for(&bare)
            .iter()
            .map(|d| d.key)
            .collect();

        assert!(rich_keys.contains(&"desiccant_left_days"));
        assert!(rich_keys.contains(&"indicator_light"));
        assert!(!bare_keys.contains(&"desiccant_left_days"));
        // Forced entity present either way
        assert!(rich_keys.contains(&"error_message"));
        assert!(bare_keys.contains(&"error_message"));
    }

    #[test]
    fn unknown_type_tag_gets_no_entities() {
        let registry = DescriptorRegistry::new();
        let device = Device::new(DeviceId::new(1), "SN1", "Mystery", "x9");
        assert!(registry.supported_for(&device).is_empty());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary sensor descriptor tables.

use crate::device::{D4H, D4SH, Device};

use super::{EntityCategory, EntityDescriptor, StateValue};

fn bool_at(device: &Device, path: &str) -> Option<StateValue> {
    device.state_bool(path).map(StateValue::Bool)
}

// ===== Feeder =====

fn feeding(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.feeding")
}

fn battery_power(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.pim")
        .map(|pim| StateValue::Bool(pim == 2))
}

fn eating(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.eating")
}

fn camera_status(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.camera")
}

fn food_level_low_1(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.food1")
        .map(|level| StateValue::Bool(level < 1))
}

fn food_level_low_2(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.food2")
        .map(|level| StateValue::Bool(level < 1))
}

// ===== Litter box =====

fn liquid_empty(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.liquidEmpty")
}

fn liquid_lack(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.liquidLack")
}

fn sand_lack(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.sandLack")
}

fn waste_bin_full(device: &Device) -> Option<StateValue> {
    bool_at(device, "state.boxFull")
}

fn waste_bin_present(device: &Device) -> Option<StateValue> {
    device
        .state_bool("state.boxState")
        .map(|removed| StateValue::Bool(!removed))
}

// ===== Water fountain =====

fn low_power(device: &Device) -> Option<StateValue> {
    bool_at(device, "lowPower")
}

fn power(device: &Device) -> Option<StateValue> {
    bool_at(device, "powerStatus")
}

fn lack_warning(device: &Device) -> Option<StateValue> {
    bool_at(device, "lackWarning")
}

/// Binary sensor descriptors for feeders.
pub(super) fn feeder() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::binary_sensor("feeding", feeding),
        EntityDescriptor::binary_sensor("battery_power", battery_power)
            .with_category(EntityCategory::Diagnostic),
        EntityDescriptor::binary_sensor("eating", eating),
        // Only the camera-equipped models expose the camera flag.
        EntityDescriptor::binary_sensor("camera_status", camera_status)
            .with_only_for_types(&[D4H, D4SH]),
        EntityDescriptor::binary_sensor("food_level_1", food_level_low_1)
            .with_icon("mdi:food-drumstick-off"),
        EntityDescriptor::binary_sensor("food_level_2", food_level_low_2)
            .with_icon("mdi:food-drumstick-off"),
    ]
}

/// Binary sensor descriptors for litter boxes.
pub(super) fn litter() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::binary_sensor("liquid_empty", liquid_empty),
        EntityDescriptor::binary_sensor("liquid_lack", liquid_lack),
        EntityDescriptor::binary_sensor("sand_lack", sand_lack),
        EntityDescriptor::binary_sensor("waste_bin", waste_bin_full),
        EntityDescriptor::binary_sensor("waste_bin_presence", waste_bin_present),
    ]
}

/// Binary sensor descriptors for water fountains.
pub(super) fn water_fountain() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::binary_sensor("low_power", low_power),
        EntityDescriptor::binary_sensor("power", power),
        EntityDescriptor::binary_sensor("lack_warning", lack_warning),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;
    use serde_json::json;

    #[test]
    fn camera_restricted_to_camera_models() {
        let descriptors = feeder();
        let camera = descriptors
            .iter()
            .find(|d| d.key == "camera_status")
            .unwrap();

        let state = json!({"state": {"camera": 1}});
        let d4h = Device::new(DeviceId::new(1), "SN1", "Feeder", "d4h").with_state(state.clone());
        let d4 = Device::new(DeviceId::new(2), "SN2", "Feeder", "d4").with_state(state);

        assert!(camera.is_supported(&d4h));
        assert!(!camera.is_supported(&d4));
    }

    #[test]
    fn integer_flags_read_as_bool() {
        let device = Device::new(DeviceId::new(1), "SN1", "Litter", "t4")
            .with_state(json!({"state": {"boxFull": 1, "boxState": 0}}));

        assert_eq!(waste_bin_full(&device), Some(StateValue::Bool(true)));
        assert_eq!(waste_bin_present(&device), Some(StateValue::Bool(true)));
    }

    #[test]
    fn battery_power_derived_from_pim() {
        let device = Device::new(DeviceId::new(1), "SN1", "Feeder", "d4")
            .with_state(json!({"state": {"pim": 2}}));
        assert_eq!(battery_power(&device), Some(StateValue::Bool(true)));
    }
}

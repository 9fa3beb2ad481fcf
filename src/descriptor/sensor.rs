// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor descriptor tables.
//!
//! Value accessors read dotted paths out of the raw cloud state payload;
//! a missing path makes the applicability probe reject the entity for
//! that device.

use crate::device::{D4S, DEVICES_FEEDER, DEVICES_LITTER_BOX, Device, K2};

use super::{EntityCategory, EntityDescriptor, StateValue};

fn device_status(device: &Device) -> Option<StateValue> {
    let status = match device.state_i64("state.pim")? {
        0 => "Offline",
        1 => "Online",
        2 => "On Battery",
        _ => "Unknown Status",
    };
    Some(StateValue::Text(status.to_string()))
}

fn rssi(device: &Device) -> Option<StateValue> {
    device.state_i64("state.wifi.rsq").map(StateValue::Int)
}

fn error_message(device: &Device) -> Option<StateValue> {
    let message = device.state_str("state.errorMsg").unwrap_or("No error");
    Some(StateValue::Text(message.to_string()))
}

// ===== Feeder =====

fn desiccant_left_days(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.desiccantLeftDays")
        .map(StateValue::Int)
}

fn battery_level(device: &Device) -> Option<StateValue> {
    if device.state_i64("state.pim")? != 2 {
        return Some(StateValue::Text("Not in use".to_string()));
    }
    let level = match device.state_i64("state.batteryStatus")? {
        0 => "Low",
        1 => "Normal",
        _ => "Unknown",
    };
    Some(StateValue::Text(level.to_string()))
}

fn times_dispensed(device: &Device) -> Option<StateValue> {
    device.state_i64("state.feedState.times").map(StateValue::Int)
}

fn total_planned(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.feedState.planAmountTotal")
        .map(StateValue::Int)
}

fn total_dispensed(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.feedState.realAmountTotal")
        .map(StateValue::Int)
}

fn manual_dispensed(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.feedState.addAmountTotal")
        .map(StateValue::Int)
}

fn amount_eaten(device: &Device) -> Option<StateValue> {
    device.state_i64("state.feedState.eatAmountTotal").map(StateValue::Int)
}

fn times_eaten(device: &Device) -> Option<StateValue> {
    device.state_i64("state.feedState.eatTimes").map(StateValue::Int)
}

fn times_eaten_d4s(device: &Device) -> Option<StateValue> {
    device
        .state_path("state.feedState.eatTimes")?
        .as_array()
        .map(|times| StateValue::Int(i64::try_from(times.len()).unwrap_or(i64::MAX)))
}

fn food_in_bowl(device: &Device) -> Option<StateValue> {
    device.state_i64("state.weight").map(StateValue::Int)
}

fn food_left(device: &Device) -> Option<StateValue> {
    device.state_i64("state.percent").map(StateValue::Int)
}

// ===== Litter box =====

fn litter_level(device: &Device) -> Option<StateValue> {
    device.state_i64("state.sandPercent").map(StateValue::Int)
}

fn litter_weight(device: &Device) -> Option<StateValue> {
    device
        .state_f64("state.sandWeight")
        .map(|grams| StateValue::Float((grams / 1000.0 * 10.0).round() / 10.0))
}

fn litter_state(device: &Device) -> Option<StateValue> {
    let state = match device.state_i64("state.workState.workMode")? {
        0 => "Cleaning",
        1 => "Dumping",
        2 => "Leveling",
        3 => "Resetting",
        4 => "Deodorizing",
        9 => "Maintenance",
        _ => "Idle",
    };
    Some(StateValue::Text(state.to_string()))
}

fn deodorant_left_days(device: &Device) -> Option<StateValue> {
    device
        .state_i64("state.liquidLeftDays")
        .map(StateValue::Int)
}

// ===== Water fountain =====

fn pump_energy(device: &Device) -> Option<StateValue> {
    let run_time = device.state_f64("todayPumpRunTime")?;
    Some(StateValue::Float((0.75 * run_time) / 3_600_000.0))
}

fn filter_percent(device: &Device) -> Option<StateValue> {
    device.state_i64("filterPercent").map(StateValue::Int)
}

fn purified_water(device: &Device) -> Option<StateValue> {
    let run_time = device.state_f64("todayPumpRunTime")?;
    #[allow(clippy::cast_possible_truncation)]
    Some(StateValue::Int((((1.5 * run_time) / 60.0) / 2.0) as i64))
}

// ===== Purifier =====

fn humidity(device: &Device) -> Option<StateValue> {
    // Reported in tenths of a percent
    device
        .state_f64("state.humidity")
        .map(|tenths| StateValue::Float((tenths / 10.0).round()))
}

fn temperature(device: &Device) -> Option<StateValue> {
    device
        .state_f64("state.temp")
        .map(|tenths| StateValue::Float((tenths / 10.0).round()))
}

fn air_purified(device: &Device) -> Option<StateValue> {
    device
        .state_f64("state.refresh")
        .map(|volume| StateValue::Float(volume.round()))
}

// ===== Pet =====

fn pet_last_weight(device: &Device) -> Option<StateValue> {
    device
        .state_f64("lastMeasuredWeight")
        .map(|grams| StateValue::Float((grams / 1000.0 * 100.0).round() / 100.0))
}

fn pet_last_use_duration(device: &Device) -> Option<StateValue> {
    device.state_i64("lastDurationUsage").map(StateValue::Int)
}

fn pet_last_device_used(device: &Device) -> Option<StateValue> {
    device
        .state_str("lastDeviceUsed")
        .map(|name| StateValue::Text(name.to_string()))
}

/// Sensor descriptors for feeders.
pub(super) fn feeder() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::sensor("device_status", device_status)
            .with_category(EntityCategory::Diagnostic),
        EntityDescriptor::sensor("desiccant_left_days", desiccant_left_days).with_unit("d"),
        EntityDescriptor::sensor("battery_level", battery_level)
            .with_category(EntityCategory::Diagnostic),
        EntityDescriptor::sensor("rssi", rssi)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("dBm"),
        EntityDescriptor::sensor("error_message", error_message)
            .with_category(EntityCategory::Diagnostic)
            .with_force_add(DEVICES_FEEDER),
        EntityDescriptor::sensor("times_dispensed", times_dispensed)
            .with_category(EntityCategory::Diagnostic),
        EntityDescriptor::sensor("total_planned", total_planned)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("g"),
        EntityDescriptor::sensor("total_dispensed", total_dispensed)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("g"),
        EntityDescriptor::sensor("manual_dispensed", manual_dispensed)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("g"),
        EntityDescriptor::sensor("amount_eaten", amount_eaten).with_unit("g"),
        // Single-bowl feeders report a plain counter; the dual-hopper D4S
        // reports a list of eating events instead.
        EntityDescriptor::sensor("times_eaten", times_eaten).with_ignore_types(&[D4S]),
        EntityDescriptor::sensor("times_eaten", times_eaten_d4s).with_only_for_types(&[D4S]),
        EntityDescriptor::sensor("food_in_bowl", food_in_bowl).with_unit("g"),
        EntityDescriptor::sensor("food_left", food_left).with_unit("%"),
    ]
}

/// Sensor descriptors for litter boxes.
pub(super) fn litter() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::sensor("device_status", device_status)
            .with_category(EntityCategory::Diagnostic),
        EntityDescriptor::sensor("litter_level", litter_level).with_unit("%"),
        EntityDescriptor::sensor("litter_weight", litter_weight)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("kg"),
        EntityDescriptor::sensor("rssi", rssi)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("dBm"),
        EntityDescriptor::sensor("error_message", error_message)
            .with_category(EntityCategory::Diagnostic)
            .with_force_add(DEVICES_LITTER_BOX),
        EntityDescriptor::sensor("litter_state", litter_state),
        EntityDescriptor::sensor("deodorant_left_days", deodorant_left_days).with_unit("d"),
    ]
}

/// Sensor descriptors for water fountains.
pub(super) fn water_fountain() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::sensor("today_pump_run_time", pump_energy)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("kWh"),
        EntityDescriptor::sensor("filter_percent", filter_percent).with_unit("%"),
        EntityDescriptor::sensor("purified_water", purified_water)
            .with_category(EntityCategory::Diagnostic),
    ]
}

/// Sensor descriptors for air purifiers.
pub(super) fn purifier() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::sensor("humidity", humidity).with_unit("%"),
        EntityDescriptor::sensor("temperature", temperature).with_unit("°C"),
        EntityDescriptor::sensor("air_purified", air_purified).with_unit("m³"),
        EntityDescriptor::sensor("error_message", error_message)
            .with_category(EntityCategory::Diagnostic)
            .with_force_add(&[K2]),
        EntityDescriptor::sensor("rssi", rssi)
            .with_category(EntityCategory::Diagnostic)
            .with_unit("dBm"),
    ]
}

/// Sensor descriptors for pet profiles.
pub(super) fn pet() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::sensor("pet_last_weight_measurement", pet_last_weight).with_unit("kg"),
        EntityDescriptor::sensor("pet_last_use_duration", pet_last_use_duration).with_unit("s"),
        EntityDescriptor::sensor("pet_last_device_used", pet_last_device_used),
    ]
}

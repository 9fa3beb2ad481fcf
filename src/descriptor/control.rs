// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Actionable descriptor tables: switches, buttons, numbers, selects and
//! text inputs.
//!
//! Command builders produce fire-and-forget cloud actions; the state change
//! shows up through the accelerated polling that follows dispatch.

use serde_json::json;

use crate::client::ApiCommand;
use crate::device::{D3, D4H, D4S, D4SH, DEVICES_FEEDER, DEVICES_LITTER_BOX, Device, K2};

use super::{CommandInput, EntityCategory, EntityDescriptor, Platform, StateValue, toggle_setting};

// ===== Switches =====

fn indicator_light_value(device: &Device) -> Option<StateValue> {
    device.state_bool("settings.lightMode").map(StateValue::Bool)
}

fn indicator_light_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    toggle_setting("lightMode", input)
}

fn child_lock_value(device: &Device) -> Option<StateValue> {
    device
        .state_bool("settings.manualLock")
        .map(StateValue::Bool)
}

fn child_lock_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    toggle_setting("manualLock", input)
}

fn do_not_disturb_value(device: &Device) -> Option<StateValue> {
    device
        .state_bool("settings.disturbMode")
        .map(StateValue::Bool)
}

fn do_not_disturb_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    toggle_setting("disturbMode", input)
}

// ===== Buttons =====

fn press(input: &CommandInput) -> bool {
    matches!(input, CommandInput::Press)
}

fn reset_desiccant(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("resetDesiccant", json!({})))
}

fn cancel_manual_feed(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("cancelRealtimeFeed", json!({})))
}

fn call_pet(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("callPet", json!({})))
}

fn food_replenished(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("foodReplenished", json!({})))
}

fn start_cleaning(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("controlDevice", json!({"type": "start"})))
}

fn pause_cleaning(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    press(input).then(|| ApiCommand::new("controlDevice", json!({"type": "stop"})))
}

// ===== Numbers =====

#[allow(clippy::cast_possible_truncation)]
fn number(input: &CommandInput) -> Option<i64> {
    match input {
        CommandInput::Number(value) => Some(value.round() as i64),
        _ => None,
    }
}

fn volume_value(device: &Device) -> Option<StateValue> {
    device.state_i64("settings.volume").map(StateValue::Int)
}

fn volume_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let value = number(input)?;
    Some(ApiCommand::new("updateSettings", json!({"volume": value})))
}

fn manual_feed_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let amount = number(input)?;
    Some(ApiCommand::new("manualFeed", json!({"amount": amount})))
}

fn cleaning_delay_value(device: &Device) -> Option<StateValue> {
    device
        .state_i64("settings.stillTime")
        .map(|secs| StateValue::Int(secs / 60))
}

fn cleaning_delay_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let minutes = number(input)?;
    Some(ApiCommand::new(
        "updateSettings",
        json!({"stillTime": minutes * 60}),
    ))
}

// ===== Selects =====

fn surplus_level_value(device: &Device) -> Option<StateValue> {
    let level = match device.state_i64("settings.surplus")? {
        1 => "Low",
        2 => "Medium",
        3 => "High",
        _ => "Off",
    };
    Some(StateValue::Text(level.to_string()))
}

fn surplus_level_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let CommandInput::Text(option) = input else {
        return None;
    };
    let level = match option.as_str() {
        "Off" => 0,
        "Low" => 1,
        "Medium" => 2,
        "High" => 3,
        _ => return None,
    };
    Some(ApiCommand::new("updateSettings", json!({"surplus": level})))
}

// ===== Purifier =====

fn purifier_power_value(device: &Device) -> Option<StateValue> {
    device.state_bool("state.power").map(StateValue::Bool)
}

fn purifier_power_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let CommandInput::Toggle(on) = input else {
        return None;
    };
    Some(ApiCommand::new(
        "controlDevice",
        json!({"power": i32::from(*on)}),
    ))
}

fn purifier_mode_value(device: &Device) -> Option<StateValue> {
    let mode = match device.state_i64("state.mode")? {
        0 => "Auto",
        1 => "Silent",
        2 => "Standard",
        _ => return None,
    };
    Some(StateValue::Text(mode.to_string()))
}

fn purifier_mode_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let CommandInput::Text(option) = input else {
        return None;
    };
    let mode = match option.as_str() {
        "Auto" => 0,
        "Silent" => 1,
        "Standard" => 2,
        _ => return None,
    };
    Some(ApiCommand::new("controlDevice", json!({"mode": mode})))
}

// ===== Text =====

fn manual_feed_text_command(_: &Device, input: &CommandInput) -> Option<ApiCommand> {
    let CommandInput::Text(portions) = input else {
        return None;
    };
    // Dual-hopper portions, e.g. "2,1" for two portions hopper 1 and one
    // portion hopper 2.
    let (amount1, amount2) = portions.split_once(',')?;
    let amount1: i64 = amount1.trim().parse().ok()?;
    let amount2: i64 = amount2.trim().parse().ok()?;
    Some(ApiCommand::new(
        "manualFeed",
        json!({"amount1": amount1, "amount2": amount2}),
    ))
}

/// Control descriptors for feeders.
pub(super) fn feeder() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::control(
            "indicator_light",
            Platform::Switch,
            Some(indicator_light_value),
            indicator_light_command,
        )
        .with_category(EntityCategory::Config)
        .with_icon("mdi:lightbulb"),
        EntityDescriptor::control(
            "child_lock",
            Platform::Switch,
            Some(child_lock_value),
            child_lock_command,
        )
        .with_category(EntityCategory::Config)
        .with_icon("mdi:lock"),
        EntityDescriptor::control("reset_desiccant", Platform::Button, None, reset_desiccant)
            .with_only_for_types(DEVICES_FEEDER)
            .without_fast_poll(),
        EntityDescriptor::control(
            "cancel_manual_feed",
            Platform::Button,
            None,
            cancel_manual_feed,
        )
        .with_only_for_types(DEVICES_FEEDER),
        EntityDescriptor::control("call_pet", Platform::Button, None, call_pet)
            .with_only_for_types(&[D3])
            .without_fast_poll(),
        EntityDescriptor::control("food_replenished", Platform::Button, None, food_replenished)
            .with_only_for_types(&[D4S, D4H, D4SH])
            .without_fast_poll(),
        EntityDescriptor::control("volume", Platform::Number, Some(volume_value), volume_command)
            .with_category(EntityCategory::Config)
            .with_only_for_types(&[D3, D4H, D4SH])
            .without_fast_poll(),
        EntityDescriptor::control("manual_feed", Platform::Number, None, manual_feed_command)
            .with_unit("g")
            .with_only_for_types(&[D3]),
        EntityDescriptor::control(
            "surplus_level",
            Platform::Select,
            Some(surplus_level_value),
            surplus_level_command,
        )
        .with_category(EntityCategory::Config),
        EntityDescriptor::control(
            "manual_feed_dual",
            Platform::Text,
            None,
            manual_feed_text_command,
        )
        .with_only_for_types(&[D4S, D4SH]),
    ]
}

/// Control descriptors for litter boxes.
pub(super) fn litter() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::control(
            "child_lock",
            Platform::Switch,
            Some(child_lock_value),
            child_lock_command,
        )
        .with_category(EntityCategory::Config)
        .with_icon("mdi:lock"),
        EntityDescriptor::control(
            "do_not_disturb",
            Platform::Switch,
            Some(do_not_disturb_value),
            do_not_disturb_command,
        )
        .with_category(EntityCategory::Config)
        .without_fast_poll(),
        EntityDescriptor::control("start_cleaning", Platform::Button, None, start_cleaning)
            .with_only_for_types(DEVICES_LITTER_BOX),
        EntityDescriptor::control("pause_cleaning", Platform::Button, None, pause_cleaning)
            .with_only_for_types(DEVICES_LITTER_BOX),
        EntityDescriptor::control(
            "cleaning_delay",
            Platform::Number,
            Some(cleaning_delay_value),
            cleaning_delay_command,
        )
        .with_category(EntityCategory::Config)
        .with_unit("min")
        .without_fast_poll(),
    ]
}

/// Control descriptors for air purifiers.
pub(super) fn purifier() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::control(
            "power",
            Platform::Switch,
            Some(purifier_power_value),
            purifier_power_command,
        )
        .with_only_for_types(&[K2]),
        EntityDescriptor::control(
            "purifier_mode",
            Platform::Select,
            Some(purifier_mode_value),
            purifier_mode_command,
        )
        .with_category(EntityCategory::Config)
        .with_only_for_types(&[K2]),
    ]
}

/// Control descriptors for water fountains.
pub(super) fn water_fountain() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::control(
            "do_not_disturb",
            Platform::Switch,
            Some(do_not_disturb_value),
            do_not_disturb_command,
        )
        .with_category(EntityCategory::Config)
        .without_fast_poll(),
    ]
}

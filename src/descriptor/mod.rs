// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity descriptors and the applicability engine.
//!
//! Entities are not hand-written per device model. Each platform carries a
//! static table of [`EntityDescriptor`]s per device family, and applicability
//! to a concrete device is decided at setup by
//! [`EntityDescriptor::is_supported`]: explicit force/ignore/only type lists
//! first, then a structural probe of the value accessor against the device's
//! actual state payload. A device whose payload lacks the probed field simply
//! does not get that entity.
//!
//! # Examples
//!
//! ```
//! use petkit_lib::descriptor::DescriptorRegistry;
//! use petkit_lib::device::{Device, DeviceId};
//!
//! let registry = DescriptorRegistry::new();
//! let device = Device::new(DeviceId::new(1), "SN1", "Feeder", "d4")
//!     .with_state(serde_json::json!({"state": {"pim": 1}}));
//!
//! for descriptor in registry.supported_for(&device) {
//!     println!("{}: {:?}", descriptor.key, descriptor.platform);
//! }
//! ```

mod binary_sensor;
mod control;
mod registry;
mod sensor;

pub use registry::DescriptorRegistry;

use crate::client::ApiCommand;
use crate::device::Device;

// ===== Values =====

/// A rendered entity state value.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// On/off style value.
    Bool(bool),
    /// Integer measurement or counter.
    Int(i64),
    /// Floating-point measurement.
    Float(f64),
    /// Free-form text.
    Text(String),
}

impl StateValue {
    /// Returns true for values the applicability probe treats as absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Input to a descriptor's command builder.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandInput {
    /// Stateless trigger (button press).
    Press,
    /// On/off target (switch).
    Toggle(bool),
    /// Numeric target (number platform).
    Number(f64),
    /// Text or option target (text/select platforms).
    Text(String),
}

// ===== Descriptor =====

/// Host platform an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Read-only measurement or status.
    Sensor,
    /// Read-only on/off condition.
    BinarySensor,
    /// Writable on/off setting.
    Switch,
    /// Stateless action trigger.
    Button,
    /// Writable numeric setting.
    Number,
    /// Writable option choice.
    Select,
    /// Writable free-form text.
    Text,
}

/// Host entity category hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    /// Configuration-style entity.
    Config,
    /// Diagnostic-style entity.
    Diagnostic,
}

/// Value accessor: reads a state value out of a device snapshot.
///
/// Returning `None` means the device's payload does not carry the field;
/// the applicability probe treats that as unsupported.
pub type ValueFn = fn(&Device) -> Option<StateValue>;

/// Command builder: turns an input into the cloud API command to send.
///
/// Returning `None` means the input shape does not apply to this entity.
pub type CommandFn = fn(&Device, &CommandInput) -> Option<ApiCommand>;

/// A static description of one entity offered for a device family.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Stable key, unique within the device family.
    pub key: &'static str,
    /// Host platform.
    pub platform: Platform,
    /// Reads the entity value from device state.
    pub value: Option<ValueFn>,
    /// Builds the write command, present only on actionable entities.
    pub command: Option<CommandFn>,
    /// Host entity category hint.
    pub category: Option<EntityCategory>,
    /// Native unit of measurement.
    pub unit: Option<&'static str>,
    /// Icon hint.
    pub icon: Option<&'static str>,
    /// Type tags that get this entity regardless of probing.
    pub force_add: &'static [&'static str],
    /// Type tags that never get this entity.
    pub ignore_types: &'static [&'static str],
    /// When non-empty, the only type tags that may get this entity.
    pub only_for_types: &'static [&'static str],
    /// Whether a successful command arms accelerated polling.
    pub fast_poll: bool,
}

impl EntityDescriptor {
    /// Creates a read-only descriptor with no metadata or type lists.
    #[must_use]
    pub const fn sensor(key: &'static str, value: ValueFn) -> Self {
        Self {
            key,
            platform: Platform::Sensor,
            value: Some(value),
            command: None,
            category: None,
            unit: None,
            icon: None,
            force_add: &[],
            ignore_types: &[],
            only_for_types: &[],
            fast_poll: false,
        }
    }

    /// Creates a binary sensor descriptor.
    #[must_use]
    pub const fn binary_sensor(key: &'static str, value: ValueFn) -> Self {
        Self {
            platform: Platform::BinarySensor,
            ..Self::sensor(key, value)
        }
    }

    /// Creates an actionable descriptor on the given platform.
    #[must_use]
    pub const fn control(
        key: &'static str,
        platform: Platform,
        value: Option<ValueFn>,
        command: CommandFn,
    ) -> Self {
        Self {
            key,
            platform,
            value,
            command: Some(command),
            category: None,
            unit: None,
            icon: None,
            force_add: &[],
            ignore_types: &[],
            only_for_types: &[],
            fast_poll: true,
        }
    }

    /// Sets the entity category.
    #[must_use]
    pub const fn with_category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the native unit.
    #[must_use]
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the icon hint.
    #[must_use]
    pub const fn with_icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Forces the entity onto the given type tags.
    #[must_use]
    pub const fn with_force_add(mut self, types: &'static [&'static str]) -> Self {
        self.force_add = types;
        self
    }

    /// Excludes the given type tags.
    #[must_use]
    pub const fn with_ignore_types(mut self, types: &'static [&'static str]) -> Self {
        self.ignore_types = types;
        self
    }

    /// Restricts the entity to the given type tags.
    #[must_use]
    pub const fn with_only_for_types(mut self, types: &'static [&'static str]) -> Self {
        self.only_for_types = types;
        self
    }

    /// Disables fast polling after this entity's commands.
    #[must_use]
    pub const fn without_fast_poll(mut self) -> Self {
        self.fast_poll = false;
        self
    }

    /// Returns true if this descriptor carries a write action.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.command.is_some()
    }

    /// Decides whether this entity applies to a concrete device.
    ///
    /// Evaluated in strict order, first match wins:
    ///
    /// 1. the device's type tag is in `force_add`: supported;
    /// 2. the tag is in `ignore_types`: unsupported;
    /// 3. `only_for_types` is non-empty and the tag is not in it:
    ///    unsupported;
    /// 4. the value accessor is probed against the device's state payload;
    ///    `None` or an empty value means unsupported.
    ///
    /// Descriptors without a value accessor (pure triggers) pass step 4.
    #[must_use]
    pub fn is_supported(&self, device: &Device) -> bool {
        let tag = device.type_tag();

        if self.force_add.contains(&tag.as_str()) {
            tracing::debug!(key = self.key, %tag, "entity force-added");
            return true;
        }

        if self.ignore_types.contains(&tag.as_str()) {
            tracing::debug!(key = self.key, %tag, "entity force-ignored");
            return false;
        }

        if !self.only_for_types.is_empty() && !self.only_for_types.contains(&tag.as_str()) {
            tracing::debug!(key = self.key, %tag, "entity not for this device type");
            return false;
        }

        match self.value {
            Some(value) => match value(device) {
                Some(probed) if !probed.is_empty() => true,
                _ => {
                    tracing::debug!(key = self.key, %tag, "value probe found no field");
                    false
                }
            },
            None => true,
        }
    }
}

// ===== Shared command builders =====

/// Builds an `updateSettings` command setting one integer field from an
/// on/off input.
pub(crate) fn toggle_setting(field: &str, input: &CommandInput) -> Option<ApiCommand> {
    match input {
        CommandInput::Toggle(on) => {
            let mut payload = serde_json::Map::new();
            payload.insert(field.to_string(), serde_json::Value::from(i32::from(*on)));
            Some(ApiCommand::new(
                "updateSettings",
                serde_json::Value::Object(payload),
            ))
        }
        _ => None,
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records and identifiers.
//!
//! Devices are opaque records produced by the external cloud client. The
//! library never parses the cloud protocol itself; it consumes the parsed
//! state payload and probes it structurally through dotted-path accessors.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a PetKit device.
///
/// This is a wrapper around the stable numeric identifier assigned by the
/// cloud service, providing a distinct type that prevents accidental
/// confusion with other numeric identifiers.
///
/// # Examples
///
/// ```
/// use petkit_lib::device::DeviceId;
///
/// let id = DeviceId::new(4815162342);
/// println!("Device: {}", id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Creates a device identifier from a cloud id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying cloud id.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<DeviceId> for u64 {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

// =========================================================================
// Device type tags
// =========================================================================

/// Original feeder.
pub const FEEDER: &str = "feeder";
/// Feeder Mini.
pub const FEEDER_MINI: &str = "feedermini";
/// Fresh Element Infinity.
pub const D3: &str = "d3";
/// Fresh Element Solo.
pub const D4: &str = "d4";
/// Fresh Element Gemini (dual hopper).
pub const D4S: &str = "d4s";
/// YumShare Solo with camera.
pub const D4H: &str = "d4h";
/// YumShare Dual-hopper with camera.
pub const D4SH: &str = "d4sh";

/// Pura Max litter box.
pub const T3: &str = "t3";
/// Pura Max 2.
pub const T4: &str = "t4";
/// Purobot Max Pro.
pub const T5: &str = "t5";
/// Purobot Ultra with camera.
pub const T6: &str = "t6";

/// Eversweet Solo 2 water fountain.
pub const W5: &str = "w5";
/// Eversweet 3 Pro.
pub const CTW2: &str = "ctw2";
/// Eversweet Max.
pub const CTW3: &str = "ctw3";

/// Air Magicube purifier.
pub const K2: &str = "k2";

/// Virtual pet profile record.
pub const PET: &str = "pet";

/// All feeder type tags.
pub const DEVICES_FEEDER: &[&str] = &[FEEDER, FEEDER_MINI, D3, D4, D4S, D4H, D4SH];
/// All litter box type tags.
pub const DEVICES_LITTER_BOX: &[&str] = &[T3, T4, T5, T6];
/// All water fountain type tags.
pub const DEVICES_WATER_FOUNTAIN: &[&str] = &[W5, CTW2, CTW3];
/// All purifier type tags.
pub const DEVICES_PURIFIER: &[&str] = &[K2];

/// Broad device family, derived from the type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Food dispenser.
    Feeder,
    /// Litter box.
    Litter,
    /// Water fountain.
    WaterFountain,
    /// Air purifier.
    Purifier,
    /// Pet profile (virtual device).
    Pet,
}

impl DeviceKind {
    /// Derives the device kind from a type tag.
    ///
    /// Returns `None` for unrecognized tags so new cloud device types are
    /// skipped rather than misclassified.
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        if DEVICES_FEEDER.contains(&tag.as_str()) {
            Some(Self::Feeder)
        } else if DEVICES_LITTER_BOX.contains(&tag.as_str()) {
            Some(Self::Litter)
        } else if DEVICES_WATER_FOUNTAIN.contains(&tag.as_str()) {
            Some(Self::WaterFountain)
        } else if DEVICES_PURIFIER.contains(&tag.as_str()) {
            Some(Self::Purifier)
        } else if tag == PET {
            Some(Self::Pet)
        } else {
            None
        }
    }
}

// =========================================================================
// Device record
// =========================================================================

/// A PetKit device as reported by the cloud client.
///
/// The `state` payload is the cloud client's parsed JSON kept opaque; entity
/// descriptors probe it through the dotted-path accessors below. A path that
/// does not resolve simply yields `None`, which the descriptor engine treats
/// as "not supported on this firmware/model".
///
/// # Examples
///
/// ```
/// use petkit_lib::device::{Device, DeviceId};
/// use serde_json::json;
///
/// let device = Device::new(DeviceId::new(1), "SN001", "Kitchen feeder", "d4s")
///     .with_state(json!({"state": {"pim": 1, "feed_state": {"times": 3}}}));
///
/// assert_eq!(device.state_i64("state.pim"), Some(1));
/// assert_eq!(device.state_i64("state.feed_state.times"), Some(3));
/// assert_eq!(device.state_i64("state.missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Stable cloud identifier.
    pub id: DeviceId,
    /// Device serial number.
    pub sn: String,
    /// User-assigned device name.
    pub name: String,
    /// Device type tag (lowercase, e.g. `d4s`).
    pub device_type: String,
    /// Firmware version string.
    pub firmware: Option<String>,
    /// Opaque parsed state payload from the cloud client.
    pub state: Value,
    /// Media events reported by the cloud for this device.
    ///
    /// Empty for device types without media support.
    #[serde(default)]
    pub medias: Vec<MediaRecord>,
}

impl Device {
    /// Creates a new device record with an empty state payload.
    #[must_use]
    pub fn new(
        id: DeviceId,
        sn: impl Into<String>,
        name: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            sn: sn.into(),
            name: name.into(),
            device_type: device_type.into(),
            firmware: None,
            state: Value::Null,
            medias: Vec::new(),
        }
    }

    /// Sets the state payload.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Sets the firmware version.
    #[must_use]
    pub fn with_firmware(mut self, firmware: impl Into<String>) -> Self {
        self.firmware = Some(firmware.into());
        self
    }

    /// Sets the reported media records.
    #[must_use]
    pub fn with_medias(mut self, medias: Vec<MediaRecord>) -> Self {
        self.medias = medias;
        self
    }

    /// Returns the lowercase type tag.
    #[must_use]
    pub fn type_tag(&self) -> String {
        self.device_type.to_ascii_lowercase()
    }

    /// Returns the broad device family, if the type tag is recognized.
    #[must_use]
    pub fn kind(&self) -> Option<DeviceKind> {
        DeviceKind::from_type_tag(&self.device_type)
    }

    /// Resolves a dotted path (e.g. `state.feed_state.times`) in the state
    /// payload.
    #[must_use]
    pub fn state_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.state;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Reads an integer at a dotted path.
    #[must_use]
    pub fn state_i64(&self, path: &str) -> Option<i64> {
        self.state_path(path)?.as_i64()
    }

    /// Reads a float at a dotted path.
    #[must_use]
    pub fn state_f64(&self, path: &str) -> Option<f64> {
        self.state_path(path)?.as_f64()
    }

    /// Reads a boolean at a dotted path.
    ///
    /// The cloud encodes some flags as 0/1 integers; those are accepted too.
    #[must_use]
    pub fn state_bool(&self, path: &str) -> Option<bool> {
        let value = self.state_path(path)?;
        value.as_bool().or_else(|| value.as_i64().map(|n| n != 0))
    }

    /// Reads a string at a dotted path.
    #[must_use]
    pub fn state_str(&self, path: &str) -> Option<&str> {
        self.state_path(path)?.as_str()
    }
}

// =========================================================================
// Media records
// =========================================================================

/// Kind of media file attached to a device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Still image (snapshot).
    Image,
    /// Video clip.
    Video,
}

impl MediaType {
    /// Returns the file extension used on disk.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Video => "mp4",
        }
    }
}

/// Device event category a media file belongs to.
///
/// Mirrors the record types reported by the cloud; used both to filter
/// downloads and as the event subdirectory name in the on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Pet ate from the feeder.
    Eat,
    /// Scheduled or manual feed dispensed.
    Feed,
    /// Motion detected.
    Move,
    /// Pet detected near the device.
    Pet,
    /// Litter box visit.
    Toileting,
}

impl RecordType {
    /// All record types, in cloud enumeration order.
    pub const ALL: &'static [Self] = &[
        Self::Eat,
        Self::Feed,
        Self::Move,
        Self::Pet,
        Self::Toileting,
    ];

    /// Returns the subdirectory name used on disk.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eat => "eat",
            Self::Feed => "feed",
            Self::Move => "move",
            Self::Pet => "pet",
            Self::Toileting => "toileting",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media event reported by the cloud for a device.
///
/// Identity is the combination of device id, event type and timestamp; the
/// missing-file diff compares these keys against the local disk cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Device the event belongs to.
    pub device_id: DeviceId,
    /// Event category.
    pub event_type: RecordType,
    /// Media kind.
    pub media_type: MediaType,
    /// Event timestamp (Unix seconds).
    pub timestamp: i64,
    /// Cloud-assigned file name.
    pub file_name: String,
}

impl MediaRecord {
    /// Creates a new media record.
    ///
    /// The file name defaults to the record key plus the media extension;
    /// use [`with_file_name`](Self::with_file_name) when the cloud assigns
    /// its own.
    #[must_use]
    pub fn new(
        device_id: DeviceId,
        event_type: RecordType,
        media_type: MediaType,
        timestamp: i64,
    ) -> Self {
        let file_name = format!(
            "{device_id}_{event_type}_{timestamp}.{}",
            media_type.extension()
        );
        Self {
            device_id,
            event_type,
            media_type,
            timestamp,
            file_name,
        }
    }

    /// Sets the cloud-assigned file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Returns the identity key for the missing-file diff.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.device_id, self.event_type, self.timestamp)
    }
}

/// A media file present in the local disk cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Identity key matching [`MediaRecord::key`].
    pub record_key: String,
    /// Absolute path of the cached file.
    pub path: PathBuf,
    /// Media kind.
    pub media_type: MediaType,
}

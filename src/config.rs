// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration options, loaded once at setup.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::device::{MediaType, RecordType};

/// Default device poll interval in seconds.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;
/// Fast-poll floor interval in seconds.
pub const FAST_POLL_INTERVAL_SECS: u64 = 10;
/// Default number of accelerated polls after an actionable command.
pub const DEFAULT_FAST_POLL_TICKS: u32 = 20;
/// Default media refresh interval in minutes.
pub const DEFAULT_MEDIA_SCAN_INTERVAL_MINS: u64 = 10;
/// Default Bluetooth relay interval in minutes.
pub const DEFAULT_BLUETOOTH_SCAN_INTERVAL_MINS: u64 = 20;
/// How long a BLE session is held open for attribute exchange.
pub const BLE_DWELL_SECS: u64 = 4;

/// Options recognized by the integration.
///
/// # Examples
///
/// ```
/// use petkit_lib::config::PetkitOptions;
///
/// // Defaults
/// let options = PetkitOptions::default();
/// assert!(options.smart_polling_enabled);
///
/// // With overrides
/// let options = PetkitOptions::default()
///     .with_scan_interval_secs(30)
///     .with_media_retention_days(7)
///     .with_ble_relay(false);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PetkitOptions {
    /// Device poll interval in seconds.
    pub scan_interval_secs: u64,
    /// Media refresh interval in minutes.
    pub media_scan_interval_mins: u64,
    /// Bluetooth relay interval in minutes.
    pub bluetooth_scan_interval_mins: u64,
    /// Whether the Bluetooth relay is enabled.
    pub ble_relay_enabled: bool,
    /// Whether event images are downloaded.
    pub media_dl_image: bool,
    /// Whether event videos are downloaded.
    pub media_dl_video: bool,
    /// Event types whose media is downloaded.
    pub media_event_types: Vec<RecordType>,
    /// Media retention in days; 0 disables pruning.
    pub media_retention_days: u32,
    /// Whether fast polling after actionable commands is enabled.
    pub smart_polling_enabled: bool,
    /// Root directory of the media cache.
    pub media_path: PathBuf,
}

impl Default for PetkitOptions {
    fn default() -> Self {
        Self {
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            media_scan_interval_mins: DEFAULT_MEDIA_SCAN_INTERVAL_MINS,
            bluetooth_scan_interval_mins: DEFAULT_BLUETOOTH_SCAN_INTERVAL_MINS,
            ble_relay_enabled: true,
            media_dl_image: true,
            media_dl_video: true,
            media_event_types: RecordType::ALL.to_vec(),
            media_retention_days: 0,
            smart_polling_enabled: true,
            media_path: PathBuf::from("media"),
        }
    }
}

impl PetkitOptions {
    /// Sets the device poll interval in seconds.
    #[must_use]
    pub fn with_scan_interval_secs(mut self, secs: u64) -> Self {
        self.scan_interval_secs = secs;
        self
    }

    /// Sets the media refresh interval in minutes.
    #[must_use]
    pub fn with_media_scan_interval_mins(mut self, mins: u64) -> Self {
        self.media_scan_interval_mins = mins;
        self
    }

    /// Sets the Bluetooth relay interval in minutes.
    #[must_use]
    pub fn with_bluetooth_scan_interval_mins(mut self, mins: u64) -> Self {
        self.bluetooth_scan_interval_mins = mins;
        self
    }

    /// Enables or disables the Bluetooth relay.
    #[must_use]
    pub fn with_ble_relay(mut self, enabled: bool) -> Self {
        self.ble_relay_enabled = enabled;
        self
    }

    /// Enables or disables image downloads.
    #[must_use]
    pub fn with_media_dl_image(mut self, enabled: bool) -> Self {
        self.media_dl_image = enabled;
        self
    }

    /// Enables or disables video downloads.
    #[must_use]
    pub fn with_media_dl_video(mut self, enabled: bool) -> Self {
        self.media_dl_video = enabled;
        self
    }

    /// Restricts media downloads to the given event types.
    #[must_use]
    pub fn with_media_event_types(mut self, types: Vec<RecordType>) -> Self {
        self.media_event_types = types;
        self
    }

    /// Sets the media retention window in days (0 disables pruning).
    #[must_use]
    pub fn with_media_retention_days(mut self, days: u32) -> Self {
        self.media_retention_days = days;
        self
    }

    /// Enables or disables fast polling after actionable commands.
    #[must_use]
    pub fn with_smart_polling(mut self, enabled: bool) -> Self {
        self.smart_polling_enabled = enabled;
        self
    }

    /// Sets the media cache root directory.
    #[must_use]
    pub fn with_media_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_path = path.into();
        self
    }

    /// Returns the device poll interval.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Returns the fast-poll floor interval.
    #[must_use]
    pub fn fast_poll_interval(&self) -> Duration {
        Duration::from_secs(FAST_POLL_INTERVAL_SECS)
    }

    /// Returns the media refresh interval.
    #[must_use]
    pub fn media_scan_interval(&self) -> Duration {
        Duration::from_secs(self.media_scan_interval_mins * 60)
    }

    /// Returns the Bluetooth relay interval.
    #[must_use]
    pub fn bluetooth_scan_interval(&self) -> Duration {
        Duration::from_secs(self.bluetooth_scan_interval_mins * 60)
    }

    /// Returns the media types selected for download, from the image/video
    /// flags.
    #[must_use]
    pub fn media_types(&self) -> Vec<MediaType> {
        let mut types = Vec::with_capacity(2);
        if self.media_dl_image {
            types.push(MediaType::Image);
        }
        if self.media_dl_video {
            types.push(MediaType::Video);
        }
        types
    }

    /// Returns true if retention pruning is enabled.
    #[must_use]
    pub fn retention_enabled(&self) -> bool {
        self.media_retention_days > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = PetkitOptions::default();

        assert_eq!(options.scan_interval(), Duration::from_secs(60));
        assert_eq!(options.media_scan_interval(), Duration::from_secs(600));
        assert_eq!(options.bluetooth_scan_interval(), Duration::from_secs(1200));
        assert!(options.ble_relay_enabled);
        assert!(options.smart_polling_enabled);
        assert!(!options.retention_enabled());
        assert_eq!(options.media_event_types.len(), 5);
    }

    #[test]
    fn media_types_from_flags() {
        let both = PetkitOptions::default();
        assert_eq!(both.media_types(), vec![MediaType::Image, MediaType::Video]);

        let images_only = PetkitOptions::default().with_media_dl_video(false);
        assert_eq!(images_only.media_types(), vec![MediaType::Image]);

        let none = PetkitOptions::default()
            .with_media_dl_image(false)
            .with_media_dl_video(false);
        assert!(none.media_types().is_empty());
    }

    #[test]
    fn builder_overrides() {
        let options = PetkitOptions::default()
            .with_scan_interval_secs(15)
            .with_media_retention_days(30)
            .with_smart_polling(false)
            .with_media_path("/var/cache/petkit");

        assert_eq!(options.scan_interval(), Duration::from_secs(15));
        assert!(options.retention_enabled());
        assert!(!options.smart_polling_enabled);
        assert_eq!(options.media_path, PathBuf::from("/var/cache/petkit"));
    }

    #[test]
    fn deserialize_with_defaults() {
        let options: PetkitOptions =
            serde_json::from_str(r#"{"scan_interval_secs": 30, "media_retention_days": 7}"#)
                .unwrap();

        assert_eq!(options.scan_interval_secs, 30);
        assert_eq!(options.media_retention_days, 7);
        // Unspecified fields fall back to defaults
        assert!(options.media_dl_image);
        assert_eq!(options.media_path, PathBuf::from("media"));
    }
}

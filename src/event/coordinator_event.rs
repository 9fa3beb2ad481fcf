// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator event types.

use crate::device::DeviceId;

/// Events emitted by the coordinators.
///
/// These events notify subscribers about device churn, refresh outcomes,
/// polling cadence changes and media downloads.
///
/// # Examples
///
/// ```
/// use petkit_lib::device::DeviceId;
/// use petkit_lib::event::CoordinatorEvent;
///
/// let device_id = DeviceId::new(1);
///
/// // Device churn events
/// let discovered = CoordinatorEvent::DeviceDiscovered { device_id };
/// let stale = CoordinatorEvent::DeviceStale { device_id };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A device appeared in a successful fetch for the first time.
    DeviceDiscovered {
        /// The newly observed device.
        device_id: DeviceId,
    },

    /// A device disappeared from a successful fetch and was pruned from
    /// the host registry.
    DeviceStale {
        /// The pruned device.
        device_id: DeviceId,
    },

    /// A fetch failed for a transient reason; the previous snapshot stays
    /// visible.
    RefreshFailed {
        /// Failure description.
        reason: String,
    },

    /// The cloud session is no longer valid and the host must
    /// re-authenticate.
    AuthRequired,

    /// Fast polling was armed after an actionable command.
    FastPollArmed {
        /// Number of accelerated polls granted.
        ticks: u32,
    },

    /// Fast polling exhausted its ticks and the interval reverted to the
    /// default.
    FastPollExpired,

    /// Media files were downloaded for a device.
    MediaRefreshed {
        /// The device whose cache was updated.
        device_id: DeviceId,
        /// Number of files downloaded this cycle.
        downloaded: usize,
    },
}

impl CoordinatorEvent {
    /// Returns the device ID associated with this event, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            Self::DeviceDiscovered { device_id }
            | Self::DeviceStale { device_id }
            | Self::MediaRefreshed { device_id, .. } => Some(*device_id),
            Self::RefreshFailed { .. }
            | Self::AuthRequired
            | Self::FastPollArmed { .. }
            | Self::FastPollExpired => None,
        }
    }

    /// Returns `true` if this is a device churn event.
    #[must_use]
    pub fn is_churn(&self) -> bool {
        matches!(
            self,
            Self::DeviceDiscovered { .. } | Self::DeviceStale { .. }
        )
    }

    /// Returns `true` if this is a refresh failure event.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. } | Self::AuthRequired)
    }

    /// Creates a device discovered event.
    #[must_use]
    pub fn device_discovered(device_id: DeviceId) -> Self {
        Self::DeviceDiscovered { device_id }
    }

    /// Creates a device stale event.
    #[must_use]
    pub fn device_stale(device_id: DeviceId) -> Self {
        Self::DeviceStale { device_id }
    }

    /// Creates a refresh failed event.
    #[must_use]
    pub fn refresh_failed(reason: impl Into<String>) -> Self {
        Self::RefreshFailed {
            reason: reason.into(),
        }
    }

    /// Creates a media refreshed event.
    #[must_use]
    pub fn media_refreshed(device_id: DeviceId, downloaded: usize) -> Self {
        Self::MediaRefreshed {
            device_id,
            downloaded,
        }
    }
}

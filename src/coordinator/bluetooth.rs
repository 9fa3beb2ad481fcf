// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth relay coordinator.
//!
//! Water fountains only sync their cloud state while a BLE session is open
//! to a relay-capable device nearby. This coordinator periodically opens a
//! short session per fountain, holds it long enough for the attribute
//! exchange, and closes it again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::client::BleRelay;
use crate::config::{BLE_DWELL_SECS, PetkitOptions};
use crate::device::{DeviceId, DeviceKind};

use super::data::DeviceSnapshot;

/// Coordinator driving periodic BLE relay sessions for water fountains.
pub struct BluetoothCoordinator {
    /// Injected relay.
    relay: Arc<dyn BleRelay>,
    /// Options loaded at setup.
    options: PetkitOptions,
    /// Last successful session per fountain.
    last_success: RwLock<HashMap<DeviceId, DateTime<Utc>>>,
}

impl BluetoothCoordinator {
    /// Creates a new Bluetooth coordinator.
    #[must_use]
    pub fn new(relay: Arc<dyn BleRelay>, options: PetkitOptions) -> Self {
        Self {
            relay,
            options,
            last_success: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the last successful session timestamps per fountain.
    #[must_use]
    pub fn last_success(&self) -> HashMap<DeviceId, DateTime<Utc>> {
        self.last_success.read().clone()
    }

    /// Runs one relay cycle over the fountains in the snapshot.
    ///
    /// When the relay is disabled by configuration this returns an empty
    /// map without touching the relay. A failed open or close is logged and
    /// the fountain's timestamp is left at its previous value; the cycle
    /// continues with the next fountain.
    pub async fn refresh(&self, snapshot: &DeviceSnapshot) -> HashMap<DeviceId, DateTime<Utc>> {
        if !self.options.ble_relay_enabled {
            return HashMap::new();
        }

        for device in snapshot.values() {
            if device.kind() != Some(DeviceKind::WaterFountain) {
                continue;
            }

            if let Err(error) = self.nudge(device.id).await {
                tracing::warn!(device_id = %device.id, error = %error, "BLE relay cycle failed");
            }
        }

        self.last_success()
    }

    /// Opens, dwells and closes one BLE session.
    async fn nudge(&self, device_id: DeviceId) -> Result<(), crate::error::ClientError> {
        self.relay.open_ble_connection(device_id).await?;
        tokio::time::sleep(Duration::from_secs(BLE_DWELL_SECS)).await;
        self.relay.close_ble_connection(device_id).await?;

        self.last_success.write().insert(device_id, Utc::now());
        tracing::debug!(%device_id, "BLE relay session complete");
        Ok(())
    }

    /// Spawns the relay loop.
    ///
    /// Sleeps for the configured Bluetooth interval between cycles and reads
    /// the device snapshot fresh each time. The loop exits when the snapshot
    /// sender is dropped.
    pub fn spawn(
        coordinator: Arc<Self>,
        devices: watch::Receiver<DeviceSnapshot>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if !coordinator.options.ble_relay_enabled {
                tracing::debug!("BLE relay disabled, not starting loop");
                return;
            }
            tracing::debug!("BLE relay loop started");

            loop {
                tokio::time::sleep(coordinator.options.bluetooth_scan_interval()).await;
                if devices.has_changed().is_err() {
                    break;
                }
                let snapshot = devices.borrow().clone();
                coordinator.refresh(&snapshot).await;
            }

            tracing::debug!("BLE relay loop stopped");
        })
    }
}

impl std::fmt::Debug for BluetoothCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BluetoothCoordinator")
            .field("enabled", &self.options.ble_relay_enabled)
            .field("fountains_seen", &self.last_success.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::error::ClientError;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Relay fake counting opens/closes, optionally failing opens.
    #[derive(Default)]
    struct FakeRelay {
        opens: Mutex<Vec<DeviceId>>,
        closes: Mutex<Vec<DeviceId>>,
        fail_open: Mutex<bool>,
    }

    #[async_trait]
    impl BleRelay for FakeRelay {
        async fn open_ble_connection(&self, device_id: DeviceId) -> Result<(), ClientError> {
            if *self.fail_open.lock() {
                return Err(ClientError::Library("relay unreachable".into()));
            }
            self.opens.lock().push(device_id);
            Ok(())
        }

        async fn close_ble_connection(&self, device_id: DeviceId) -> Result<(), ClientError> {
            self.closes.lock().push(device_id);
            Ok(())
        }
    }

    fn fountain(id: u64) -> Device {
        Device::new(DeviceId::new(id), format!("SN{id}"), "Fountain", "w5")
    }

    fn feeder(id: u64) -> Device {
        Device::new(DeviceId::new(id), format!("SN{id}"), "Feeder", "d4")
    }

    fn snapshot(devices: Vec<Device>) -> DeviceSnapshot {
        Arc::new(devices.into_iter().map(|d| (d.id, d)).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_relay_touches_nothing() {
        let relay = Arc::new(FakeRelay::default());
        let options = PetkitOptions::default().with_ble_relay(false);
        let coordinator = BluetoothCoordinator::new(Arc::clone(&relay) as _, options);

        let result = coordinator.refresh(&snapshot(vec![fountain(1)])).await;

        assert!(result.is_empty());
        assert!(relay.opens.lock().is_empty());
        assert!(relay.closes.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_fountains_get_sessions() {
        let relay = Arc::new(FakeRelay::default());
        let coordinator =
            BluetoothCoordinator::new(Arc::clone(&relay) as _, PetkitOptions::default());

        coordinator
            .refresh(&snapshot(vec![fountain(1), feeder(2)]))
            .await;

        assert_eq!(relay.opens.lock().clone(), vec![DeviceId::new(1)]);
        assert_eq!(relay.closes.lock().clone(), vec![DeviceId::new(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn success_records_timestamp() {
        let relay = Arc::new(FakeRelay::default());
        let coordinator =
            BluetoothCoordinator::new(Arc::clone(&relay) as _, PetkitOptions::default());

        let result = coordinator.refresh(&snapshot(vec![fountain(1)])).await;
        assert!(result.contains_key(&DeviceId::new(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_open_leaves_timestamp_unset() {
        let relay = Arc::new(FakeRelay::default());
        *relay.fail_open.lock() = true;
        let coordinator =
            BluetoothCoordinator::new(Arc::clone(&relay) as _, PetkitOptions::default());

        let result = coordinator.refresh(&snapshot(vec![fountain(1)])).await;

        assert!(result.is_empty());
        assert!(relay.closes.lock().is_empty());
    }
}

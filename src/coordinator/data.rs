// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-state polling coordinator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};

use crate::client::{CloudClient, DOMAIN, DeviceRegistry};
use crate::config::{DEFAULT_FAST_POLL_TICKS, PetkitOptions};
use crate::device::{Device, DeviceId};
use crate::error::RefreshError;
use crate::event::{CoordinatorEvent, EventBus};

use super::polling::{PollTransition, PollingState, RefreshBackoff};

/// Shared snapshot of the current device map.
pub type DeviceSnapshot = Arc<HashMap<DeviceId, Device>>;

/// Coordinator maintaining fresh device state from the cloud.
///
/// On each cycle the coordinator advances the polling cadence, fetches
/// device state through the injected [`CloudClient`], prunes devices that
/// disappeared from the account out of the host registry, fans the new
/// snapshot out over a watch channel, and hands the observed device set to
/// the media coordinator's queue without blocking.
///
/// A fetch failure never mutates the tracked device set or the published
/// snapshot: entities keep rendering the last-known values.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use petkit_lib::config::PetkitOptions;
/// use petkit_lib::coordinator::DataCoordinator;
/// # use petkit_lib::client::{CloudClient, DeviceRegistry};
///
/// # async fn example(client: Arc<dyn CloudClient>, registry: Arc<dyn DeviceRegistry>) {
/// let coordinator = Arc::new(DataCoordinator::new(
///     client,
///     registry,
///     PetkitOptions::default(),
///     "entry-1",
/// ));
///
/// // Watch the device snapshot
/// let mut devices = coordinator.watch_devices();
///
/// // Run the polling loop
/// let handle = DataCoordinator::spawn(Arc::clone(&coordinator));
/// # }
/// ```
pub struct DataCoordinator {
    /// Injected cloud client.
    client: Arc<dyn CloudClient>,
    /// Injected host device registry.
    registry: Arc<dyn DeviceRegistry>,
    /// Options loaded at setup.
    options: PetkitOptions,
    /// Config entry owning this coordinator; registry pruning is scoped
    /// to it.
    config_entry_id: String,
    /// Adaptive polling cadence.
    polling: Mutex<PollingState>,
    /// Device ids observed at the last successful fetch.
    previous_devices: Mutex<HashSet<DeviceId>>,
    /// Snapshot fan-out to entities.
    devices_tx: watch::Sender<DeviceSnapshot>,
    /// Event bus for churn/cadence/failure notifications.
    event_bus: EventBus,
    /// Queue to the media coordinator worker, attached after construction.
    media_queue: Mutex<Option<mpsc::UnboundedSender<HashSet<DeviceId>>>>,
    /// Wakes the polling loop for an on-demand refresh.
    refresh_now: Notify,
}

impl DataCoordinator {
    /// Creates a new data coordinator.
    ///
    /// The coordinator does not poll until [`spawn`](Self::spawn) is called;
    /// [`refresh`](Self::refresh) can also be driven manually.
    #[must_use]
    pub fn new(
        client: Arc<dyn CloudClient>,
        registry: Arc<dyn DeviceRegistry>,
        options: PetkitOptions,
        config_entry_id: impl Into<String>,
    ) -> Self {
        let polling = PollingState::new(options.scan_interval(), options.fast_poll_interval());
        let (devices_tx, _) = watch::channel(DeviceSnapshot::default());

        Self {
            client,
            registry,
            options,
            config_entry_id: config_entry_id.into(),
            polling: Mutex::new(polling),
            previous_devices: Mutex::new(HashSet::new()),
            devices_tx,
            event_bus: EventBus::new(),
            media_queue: Mutex::new(None),
            refresh_now: Notify::new(),
        }
    }

    /// Attaches the media coordinator's refresh queue.
    ///
    /// Each successful fetch enqueues the device set captured by that cycle.
    pub fn attach_media_queue(&self, queue: mpsc::UnboundedSender<HashSet<DeviceId>>) {
        *self.media_queue.lock() = Some(queue);
    }

    /// Subscribes to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CoordinatorEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the event bus shared with the other coordinators.
    #[must_use]
    pub fn event_bus(&self) -> EventBus {
        self.event_bus.clone()
    }

    /// Creates a watch receiver for the device snapshot.
    #[must_use]
    pub fn watch_devices(&self) -> watch::Receiver<DeviceSnapshot> {
        self.devices_tx.subscribe()
    }

    /// Returns the current device snapshot.
    #[must_use]
    pub fn devices(&self) -> DeviceSnapshot {
        self.devices_tx.borrow().clone()
    }

    /// Returns the interval the next poll cycle will use.
    #[must_use]
    pub fn current_interval(&self) -> std::time::Duration {
        self.polling.lock().current_interval()
    }

    /// Arms accelerated polling after an actionable command.
    ///
    /// A no-op when smart polling is disabled by configuration or when fast
    /// polling is already armed, so simultaneous triggers never stack.
    pub fn enable_fast_polling(&self, ticks: u32) {
        if !self.options.smart_polling_enabled {
            tracing::debug!("smart polling disabled, ignoring fast-poll request");
            return;
        }

        if self.polling.lock().arm(ticks) {
            tracing::debug!(ticks, "fast polling armed");
            self.event_bus.publish(CoordinatorEvent::FastPollArmed { ticks });
        }
    }

    /// Arms accelerated polling with the default tick budget.
    pub fn enable_fast_polling_default(&self) {
        self.enable_fast_polling(DEFAULT_FAST_POLL_TICKS);
    }

    /// Advances the polling cadence by one cycle.
    ///
    /// Called once per cycle before the fetch; interval changes only ever
    /// take effect at these boundaries.
    fn update_smart_polling(&self) {
        let transition = self.polling.lock().tick();
        match transition {
            PollTransition::Ticked { remaining } => {
                tracing::debug!(remaining, "fast poll tick consumed");
            }
            PollTransition::Reverted => {
                tracing::debug!("fast poll exhausted, interval reset to default");
                self.event_bus.publish(CoordinatorEvent::FastPollExpired);
            }
            PollTransition::Unchanged => {}
        }
    }

    /// Runs one refresh cycle.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::AuthRequired`] when the session is invalid
    /// (the host must re-authenticate) or [`RefreshError::UpdateFailed`] for
    /// transient fetch failures. In both cases the previously tracked device
    /// set and the published snapshot are left untouched.
    pub async fn refresh(&self) -> Result<DeviceSnapshot, RefreshError> {
        self.update_smart_polling();

        if let Err(error) = self.client.get_devices_data().await {
            let classified = RefreshError::classify(error);
            if classified.is_auth() {
                tracing::warn!(error = %classified, "cloud session invalid");
                self.event_bus.publish(CoordinatorEvent::AuthRequired);
            } else {
                tracing::warn!(error = %classified, "device fetch failed");
                self.event_bus
                    .publish(CoordinatorEvent::refresh_failed(classified.to_string()));
            }
            return Err(classified);
        }

        let data = self.client.devices();
        let current: HashSet<DeviceId> = data.keys().copied().collect();

        let (stale, discovered) = {
            let mut previous = self.previous_devices.lock();
            let stale: Vec<DeviceId> = previous.difference(&current).copied().collect();
            let discovered: Vec<DeviceId> = current.difference(&previous).copied().collect();
            *previous = current.clone();
            (stale, discovered)
        };

        for device_id in stale {
            self.prune_stale_device(device_id);
        }
        for device_id in discovered {
            tracing::debug!(%device_id, "device discovered");
            self.event_bus
                .publish(CoordinatorEvent::device_discovered(device_id));
        }

        let snapshot: DeviceSnapshot = Arc::new(data);
        self.devices_tx.send_replace(Arc::clone(&snapshot));

        // Hand the captured device set to the media worker without blocking
        // this cycle; a dropped worker just means no media processing.
        if let Some(queue) = self.media_queue.lock().as_ref() {
            let _ = queue.send(current);
        }

        tracing::debug!(devices = snapshot.len(), "device refresh complete");
        Ok(snapshot)
    }

    /// Removes a stale device from the host registry.
    ///
    /// The lookup is scoped to this integration's domain and the removal to
    /// this config entry, so devices owned by other integrations or entries
    /// are never touched.
    fn prune_stale_device(&self, device_id: DeviceId) {
        if let Some(entry) = self.registry.device_by_identifier(DOMAIN, device_id) {
            self.registry
                .remove_config_entry(&entry, &self.config_entry_id);
            tracing::info!(%device_id, "stale device pruned from registry");
        } else {
            tracing::debug!(%device_id, "stale device not present in registry");
        }
        self.event_bus
            .publish(CoordinatorEvent::device_stale(device_id));
    }

    /// Wakes the polling loop for an immediate refresh.
    ///
    /// Used after dispatching a command so the resulting state change shows
    /// up without waiting a full interval.
    pub fn request_refresh(&self) {
        self.refresh_now.notify_one();
    }

    /// Spawns the polling loop.
    ///
    /// The loop sleeps for the current interval (re-read every cycle so
    /// cadence changes apply at the next boundary), refreshes, and backs off
    /// exponentially across consecutive transient failures. An
    /// authentication failure stops the loop; re-authentication and restart
    /// are the host's responsibility.
    pub fn spawn(coordinator: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let backoff = RefreshBackoff::new(coordinator.options.scan_interval());

        tokio::spawn(async move {
            tracing::debug!("device polling loop started");
            let mut failures: u32 = 0;

            loop {
                let delay = if failures == 0 {
                    coordinator.current_interval()
                } else {
                    backoff.delay_for_attempt(failures - 1)
                };

                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = coordinator.refresh_now.notified() => {
                        tracing::debug!("on-demand refresh requested");
                    }
                }

                match coordinator.refresh().await {
                    Ok(_) => failures = 0,
                    Err(error) if error.is_auth() => {
                        tracing::warn!("stopping polling loop until re-authentication");
                        break;
                    }
                    Err(_) => {
                        failures = failures.saturating_add(1);
                        tracing::debug!(failures, "transient refresh failure");
                    }
                }
            }

            tracing::debug!("device polling loop stopped");
        })
    }
}

impl std::fmt::Debug for DataCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCoordinator")
            .field("config_entry_id", &self.config_entry_id)
            .field("devices", &self.devices_tx.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiCommand, RegistryEntryId};
    use crate::error::ClientError;

    use std::collections::VecDeque;
    use std::time::Duration;

    /// Scripted cloud client: pops one fetch outcome per call, then serves
    /// the configured device map.
    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<(), ClientError>>>,
        devices: Mutex<HashMap<DeviceId, Device>>,
    }

    impl ScriptedClient {
        fn new(devices: Vec<Device>) -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                devices: Mutex::new(devices.into_iter().map(|d| (d.id, d)).collect()),
            }
        }

        fn push_outcome(&self, outcome: Result<(), ClientError>) {
            self.outcomes.lock().push_back(outcome);
        }

        fn set_devices(&self, devices: Vec<Device>) {
            *self.devices.lock() = devices.into_iter().map(|d| (d.id, d)).collect();
        }
    }

    #[async_trait::async_trait]
    impl CloudClient for ScriptedClient {
        async fn get_devices_data(&self) -> Result<(), ClientError> {
            self.outcomes.lock().pop_front().unwrap_or(Ok(()))
        }

        fn devices(&self) -> HashMap<DeviceId, Device> {
            self.devices.lock().clone()
        }

        async fn send_api_request(
            &self,
            _device_id: DeviceId,
            _command: ApiCommand,
        ) -> Result<(), ClientError> {
            Ok(())
        }
    }

    /// Registry fake recording removals; entries are seeded per domain.
    #[derive(Default)]
    struct FakeRegistry {
        entries: Mutex<HashMap<(String, DeviceId), RegistryEntryId>>,
        removed: Mutex<Vec<(RegistryEntryId, String)>>,
    }

    impl FakeRegistry {
        fn seed(&self, domain: &str, device_id: DeviceId, entry: &str) {
            self.entries.lock().insert(
                (domain.to_string(), device_id),
                RegistryEntryId(entry.to_string()),
            );
        }
    }

    impl DeviceRegistry for FakeRegistry {
        fn device_by_identifier(
            &self,
            domain: &str,
            device_id: DeviceId,
        ) -> Option<RegistryEntryId> {
            self.entries
                .lock()
                .get(&(domain.to_string(), device_id))
                .cloned()
        }

        fn remove_config_entry(&self, entry: &RegistryEntryId, config_entry_id: &str) {
            self.removed
                .lock()
                .push((entry.clone(), config_entry_id.to_string()));
        }
    }

    fn feeder(id: u64) -> Device {
        Device::new(DeviceId::new(id), format!("SN{id}"), "Feeder", "d4")
    }

    fn coordinator_with(
        client: Arc<ScriptedClient>,
        registry: Arc<FakeRegistry>,
        options: PetkitOptions,
    ) -> DataCoordinator {
        DataCoordinator::new(client, registry, options, "entry-1")
    }

    #[tokio::test]
    async fn successful_refresh_tracks_device_set() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(1), feeder(2)]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        let snapshot = coordinator.refresh().await.unwrap();
        assert_eq!(snapshot.len(), 2);

        let previous = coordinator.previous_devices.lock().clone();
        assert_eq!(
            previous,
            [DeviceId::new(1), DeviceId::new(2)].into_iter().collect()
        );
    }

    #[tokio::test]
    async fn failed_refresh_leaves_previous_untouched() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(1)]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        coordinator.refresh().await.unwrap();
        let before = coordinator.previous_devices.lock().clone();

        client.push_outcome(Err(ClientError::Library("cloud hiccup".into())));
        let error = coordinator.refresh().await.unwrap_err();
        assert!(matches!(error, RefreshError::UpdateFailed(_)));

        let after = coordinator.previous_devices.lock().clone();
        assert_eq!(before, after);
        // Snapshot also frozen at last-known values
        assert_eq!(coordinator.devices().len(), 1);
    }

    #[tokio::test]
    async fn auth_failure_is_classified() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        client.push_outcome(Err(ClientError::SessionExpired));
        let error = coordinator.refresh().await.unwrap_err();
        assert!(error.is_auth());
    }

    #[tokio::test]
    async fn auth_failure_publishes_event() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());
        let mut events = coordinator.subscribe();

        client.push_outcome(Err(ClientError::SessionExpired));
        let _ = coordinator.refresh().await;

        let event = events.recv().await.unwrap();
        assert_eq!(event, CoordinatorEvent::AuthRequired);
    }

    #[tokio::test]
    async fn stale_devices_pruned_scoped_to_entry() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(1), feeder(2)]));
        let registry = Arc::new(FakeRegistry::default());
        registry.seed(DOMAIN, DeviceId::new(2), "registry-entry-2");
        // Identifier collision: same numeric id registered by another domain
        registry.seed("other_integration", DeviceId::new(2), "foreign-entry");

        let coordinator = coordinator_with(
            Arc::clone(&client),
            Arc::clone(&registry),
            PetkitOptions::default(),
        );

        coordinator.refresh().await.unwrap();

        // Device 2 disappears
        client.set_devices(vec![feeder(1)]);
        coordinator.refresh().await.unwrap();

        let removed = registry.removed.lock().clone();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, RegistryEntryId("registry-entry-2".into()));
        assert_eq!(removed[0].1, "entry-1");
    }

    #[tokio::test]
    async fn churn_events_published() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(1)]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        let mut events = coordinator.subscribe();
        coordinator.refresh().await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            CoordinatorEvent::device_discovered(DeviceId::new(1))
        );

        client.set_devices(vec![]);
        coordinator.refresh().await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event, CoordinatorEvent::device_stale(DeviceId::new(1)));
    }

    #[tokio::test]
    async fn fast_polling_rearm_is_idempotent() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        coordinator.enable_fast_polling(5);
        coordinator.enable_fast_polling(50);

        assert_eq!(coordinator.polling.lock().ticks_remaining(), 5);
        assert_eq!(coordinator.current_interval(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn fast_polling_respects_config_flag() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let registry = Arc::new(FakeRegistry::default());
        let options = PetkitOptions::default().with_smart_polling(false);
        let coordinator = coordinator_with(Arc::clone(&client), registry, options);

        coordinator.enable_fast_polling(5);

        assert!(!coordinator.polling.lock().is_fast_polling());
        assert_eq!(coordinator.current_interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn interval_reverts_once_after_ticks_exhausted() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());
        let mut events = coordinator.subscribe();

        coordinator.enable_fast_polling(1);
        assert_eq!(coordinator.current_interval(), Duration::from_secs(10));

        coordinator.refresh().await.unwrap(); // consumes the tick
        coordinator.refresh().await.unwrap(); // reverts
        coordinator.refresh().await.unwrap(); // no-op

        assert_eq!(coordinator.current_interval(), Duration::from_secs(60));

        // Exactly one FastPollExpired among the published events
        let mut expired = 0;
        while let Ok(event) = events.try_recv() {
            if event == CoordinatorEvent::FastPollExpired {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
    }

    #[tokio::test]
    async fn media_queue_receives_captured_device_set() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(1), feeder(2)]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.attach_media_queue(tx);

        coordinator.refresh().await.unwrap();

        let set = rx.recv().await.unwrap();
        assert_eq!(
            set,
            [DeviceId::new(1), DeviceId::new(2)].into_iter().collect()
        );
    }

    #[tokio::test]
    async fn watch_devices_sees_snapshot() {
        let client = Arc::new(ScriptedClient::new(vec![feeder(7)]));
        let registry = Arc::new(FakeRegistry::default());
        let coordinator =
            coordinator_with(Arc::clone(&client), registry, PetkitOptions::default());

        let rx = coordinator.watch_devices();
        assert!(rx.borrow().is_empty());

        coordinator.refresh().await.unwrap();
        assert!(rx.borrow().contains_key(&DeviceId::new(7)));
    }
}

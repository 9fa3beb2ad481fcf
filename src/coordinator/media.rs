// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Media cache coordinator.
//!
//! Keeps the on-disk media cache in sync with the event media reported by
//! device state: downloads files that are reported but missing, maintains an
//! in-memory table of cached files per device, and prunes date directories
//! older than the configured retention window.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::client::MediaFetcher;
use crate::config::PetkitOptions;
use crate::device::{Device, DeviceId, MediaFile, MediaRecord};
use crate::error::MediaError;
use crate::event::{CoordinatorEvent, EventBus};

use super::data::DeviceSnapshot;

/// Format of date-named directories under each device's cache directory.
const DATE_DIR_FORMAT: &str = "%Y%m%d";

/// Coordinator for the on-disk media cache.
///
/// Work arrives on a queue fed by the data coordinator after each successful
/// device refresh; the worker drains it, diffs reported media against the
/// disk listing, downloads only what is missing, and periodically applies
/// the retention window.
pub struct MediaCoordinator {
    /// Injected download helper.
    fetcher: Arc<dyn MediaFetcher>,
    /// Options loaded at setup.
    options: PetkitOptions,
    /// Cached disk listing per device, refreshed after each pass.
    media_table: RwLock<HashMap<DeviceId, Vec<MediaFile>>>,
    /// Event bus shared with the data coordinator.
    event_bus: EventBus,
}

impl MediaCoordinator {
    /// Creates a new media coordinator.
    #[must_use]
    pub fn new(fetcher: Arc<dyn MediaFetcher>, options: PetkitOptions, event_bus: EventBus) -> Self {
        Self {
            fetcher,
            options,
            media_table: RwLock::new(HashMap::new()),
            event_bus,
        }
    }

    /// Returns the cached media files for a device.
    #[must_use]
    pub fn media_for(&self, device_id: DeviceId) -> Vec<MediaFile> {
        self.media_table
            .read()
            .get(&device_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a copy of the full media table.
    #[must_use]
    pub fn media_table(&self) -> HashMap<DeviceId, Vec<MediaFile>> {
        self.media_table.read().clone()
    }

    /// Selects the media records eligible for download under the current
    /// options: matching media type, matching event type, not yet on disk.
    fn missing_records<'a>(
        &self,
        device: &'a Device,
        on_disk: &[MediaFile],
    ) -> Vec<&'a MediaRecord> {
        let wanted_types = self.options.media_types();
        let cached: HashSet<&str> = on_disk.iter().map(|f| f.record_key.as_str()).collect();

        device
            .medias
            .iter()
            .filter(|record| wanted_types.contains(&record.media_type))
            .filter(|record| self.options.media_event_types.contains(&record.event_type))
            .filter(|record| !cached.contains(record.key().as_str()))
            .collect()
    }

    /// Synchronizes the cache for one device.
    ///
    /// Downloads the missing eligible records, then re-lists the directory
    /// so the media table reflects what is actually on disk. Individual
    /// download failures are logged and skipped; the rest of the batch still
    /// completes.
    async fn refresh_device(&self, device: &Device) -> usize {
        let root = &self.options.media_path;

        let on_disk = match self.fetcher.disk_files(root, device.id).await {
            Ok(files) => files,
            Err(error) => {
                tracing::warn!(device_id = %device.id, error = %error, "disk listing failed");
                return 0;
            }
        };

        let missing = self.missing_records(device, &on_disk);
        let mut downloaded = 0;

        for record in missing {
            match self.fetcher.download(root, record).await {
                Ok(()) => downloaded += 1,
                Err(error) => {
                    let failure = MediaError::Download {
                        key: record.key(),
                        message: error.to_string(),
                    };
                    tracing::warn!(device_id = %device.id, error = %failure, "media download failed");
                }
            }
        }

        // Re-list so the table is authoritative, downloads included.
        match self.fetcher.disk_files(root, device.id).await {
            Ok(files) => {
                self.media_table.write().insert(device.id, files);
            }
            Err(error) => {
                tracing::warn!(device_id = %device.id, error = %error, "disk re-listing failed");
            }
        }

        downloaded
    }

    /// Runs one media pass over the given devices.
    ///
    /// Devices that report no event media are skipped without touching the
    /// fetcher. Failures are contained per device.
    pub async fn refresh_media(&self, device_ids: &HashSet<DeviceId>, snapshot: &DeviceSnapshot) {
        for device_id in device_ids {
            let Some(device) = snapshot.get(device_id) else {
                continue;
            };
            if device.medias.is_empty() {
                continue;
            }

            let downloaded = self.refresh_device(device).await;
            tracing::debug!(%device_id, downloaded, "media pass complete");
            self.event_bus
                .publish(CoordinatorEvent::media_refreshed(*device_id, downloaded));
        }
    }

    /// Applies the retention window to the media cache.
    ///
    /// Walks `<media_path>/<device_id>/<YYYYMMDD>/` and removes date
    /// directories strictly older than the window. Directory names that do
    /// not parse as dates are logged and skipped. A zero retention or a
    /// missing cache root is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError::Io`] on directory walk or removal failure.
    pub fn prune_expired(&self) -> Result<usize, MediaError> {
        if !self.options.retention_enabled() {
            return Ok(0);
        }
        let cutoff = Utc::now().date_naive()
            - chrono::Days::new(u64::from(self.options.media_retention_days));
        prune_older_than(&self.options.media_path, cutoff)
    }

    /// Spawns the media worker.
    ///
    /// The worker drains the refresh queue fed by the data coordinator and
    /// applies retention pruning once per media interval. It exits when the
    /// queue sender is dropped.
    pub fn spawn(
        coordinator: Arc<Self>,
        mut queue: mpsc::UnboundedReceiver<HashSet<DeviceId>>,
        devices: tokio::sync::watch::Receiver<DeviceSnapshot>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!("media worker started");
            let mut prune_timer = tokio::time::interval(coordinator.options.media_scan_interval());
            // First tick fires immediately; skip it so pruning starts one
            // interval in.
            prune_timer.tick().await;

            loop {
                tokio::select! {
                    batch = queue.recv() => {
                        let Some(device_ids) = batch else {
                            break;
                        };
                        let snapshot = devices.borrow().clone();
                        coordinator.refresh_media(&device_ids, &snapshot).await;
                    }
                    _ = prune_timer.tick() => {
                        match coordinator.prune_expired() {
                            Ok(0) => {}
                            Ok(removed) => {
                                tracing::info!(removed, "expired media directories pruned");
                            }
                            Err(error) => {
                                tracing::warn!(error = %error, "media pruning failed");
                            }
                        }
                    }
                }
            }

            tracing::debug!("media worker stopped");
        })
    }
}

impl std::fmt::Debug for MediaCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCoordinator")
            .field("devices_cached", &self.media_table.read().len())
            .finish_non_exhaustive()
    }
}

/// Removes date directories older than `cutoff` under every device
/// directory of `root`.
///
/// Returns the number of directories removed. The walk is best-effort:
/// failures inside one device's subtree are logged and the remaining
/// devices still get pruned. Only an unreadable cache root aborts the
/// pass; a missing root yields zero.
fn prune_older_than(root: &Path, cutoff: NaiveDate) -> Result<usize, MediaError> {
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;

    for device_entry in std::fs::read_dir(root)? {
        let device_dir = match device_entry {
            Ok(entry) => entry.path(),
            Err(error) => {
                tracing::warn!(error = %error, "skipping unreadable cache entry");
                continue;
            }
        };
        if !device_dir.is_dir() {
            continue;
        }

        removed += prune_device_dir(&device_dir, cutoff);
    }

    Ok(removed)
}

/// Prunes one device's date directories, containing any failure to that
/// device.
fn prune_device_dir(device_dir: &Path, cutoff: NaiveDate) -> usize {
    let entries = match std::fs::read_dir(device_dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(
                dir = %device_dir.display(),
                error = %error,
                "device directory listing failed, skipping"
            );
            return 0;
        }
    };

    let mut removed = 0;

    for date_entry in entries {
        let date_dir = match date_entry {
            Ok(entry) => entry.path(),
            Err(error) => {
                tracing::warn!(dir = %device_dir.display(), error = %error, "skipping unreadable entry");
                continue;
            }
        };
        if !date_dir.is_dir() {
            continue;
        }

        let name = date_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Ok(date) = NaiveDate::parse_from_str(&name, DATE_DIR_FORMAT) else {
            tracing::warn!(
                dir = %device_dir.display(),
                error = %MediaError::InvalidDateDir(name),
                "skipping non-date directory"
            );
            continue;
        };

        if date < cutoff {
            match std::fs::remove_dir_all(&date_dir) {
                Ok(()) => {
                    tracing::debug!(dir = %date_dir.display(), "removed expired media directory");
                    removed += 1;
                }
                Err(error) => {
                    tracing::warn!(dir = %date_dir.display(), error = %error, "removal failed");
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MediaType, RecordType};
    use crate::error::ClientError;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    /// Fetcher fake with a scripted disk listing and recorded downloads.
    ///
    /// Downloaded records are appended to the listing, so re-listing after
    /// a pass sees them.
    #[derive(Default)]
    struct FakeFetcher {
        disk: Mutex<HashMap<DeviceId, Vec<MediaFile>>>,
        downloads: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn seed(&self, device_id: DeviceId, keys: &[&str]) {
            let files = keys
                .iter()
                .map(|key| MediaFile {
                    record_key: (*key).to_string(),
                    path: PathBuf::from(format!("media/{device_id}/{key}.jpg")),
                    media_type: MediaType::Image,
                })
                .collect();
            self.disk.lock().insert(device_id, files);
        }
    }

    #[async_trait]
    impl MediaFetcher for FakeFetcher {
        async fn disk_files(
            &self,
            _root: &Path,
            device_id: DeviceId,
        ) -> Result<Vec<MediaFile>, ClientError> {
            Ok(self.disk.lock().get(&device_id).cloned().unwrap_or_default())
        }

        async fn download(&self, _root: &Path, record: &MediaRecord) -> Result<(), ClientError> {
            let key = record.key();
            self.downloads.lock().push(key.clone());
            self.disk
                .lock()
                .entry(record.device_id)
                .or_default()
                .push(MediaFile {
                    record_key: key.clone(),
                    path: PathBuf::from(format!("media/{}/{key}.jpg", record.device_id)),
                    media_type: record.media_type,
                });
            Ok(())
        }
    }

    fn record(device_id: u64, timestamp: i64) -> MediaRecord {
        MediaRecord::new(
            DeviceId::new(device_id),
            RecordType::Eat,
            MediaType::Image,
            timestamp,
        )
    }

    fn device_with_records(id: u64, records: Vec<MediaRecord>) -> Device {
        Device::new(DeviceId::new(id), format!("SN{id}"), "Feeder", "d4").with_medias(records)
    }

    fn snapshot(devices: Vec<Device>) -> DeviceSnapshot {
        Arc::new(devices.into_iter().map(|d| (d.id, d)).collect())
    }

    fn coordinator(fetcher: Arc<FakeFetcher>, options: PetkitOptions) -> MediaCoordinator {
        MediaCoordinator::new(fetcher, options, EventBus::new())
    }

    #[tokio::test]
    async fn downloads_only_missing_records() {
        let fetcher = Arc::new(FakeFetcher::default());
        let device_id = DeviceId::new(1);

        let records: Vec<MediaRecord> = (0..5).map(|i| record(1, 1000 + i)).collect();
        // Three of the five already cached
        fetcher.seed(
            device_id,
            &[
                records[0].key().as_str(),
                records[1].key().as_str(),
                records[2].key().as_str(),
            ],
        );

        let media = coordinator(Arc::clone(&fetcher), PetkitOptions::default());
        let snap = snapshot(vec![device_with_records(1, records.clone())]);

        media
            .refresh_media(&[device_id].into_iter().collect(), &snap)
            .await;

        let downloads = fetcher.downloads.lock().clone();
        assert_eq!(downloads.len(), 2);
        assert!(downloads.contains(&records[3].key()));
        assert!(downloads.contains(&records[4].key()));

        // Table reflects the full on-disk set after the pass
        assert_eq!(media.media_for(device_id).len(), 5);
    }

    #[tokio::test]
    async fn devices_without_media_are_skipped() {
        let fetcher = Arc::new(FakeFetcher::default());
        let media = coordinator(Arc::clone(&fetcher), PetkitOptions::default());
        let snap = snapshot(vec![device_with_records(1, vec![])]);

        media
            .refresh_media(&[DeviceId::new(1)].into_iter().collect(), &snap)
            .await;

        assert!(fetcher.downloads.lock().is_empty());
        assert!(media.media_table().is_empty());
    }

    #[tokio::test]
    async fn media_type_filter_applies() {
        let fetcher = Arc::new(FakeFetcher::default());
        let options = PetkitOptions::default().with_media_dl_video(false);
        let media = coordinator(Arc::clone(&fetcher), options);

        let image = record(1, 1000);
        let video = MediaRecord::new(DeviceId::new(1), RecordType::Eat, MediaType::Video, 2000);
        let snap = snapshot(vec![device_with_records(1, vec![image.clone(), video])]);

        media
            .refresh_media(&[DeviceId::new(1)].into_iter().collect(), &snap)
            .await;

        let downloads = fetcher.downloads.lock().clone();
        assert_eq!(downloads, vec![image.key()]);
    }

    #[tokio::test]
    async fn event_type_filter_applies() {
        let fetcher = Arc::new(FakeFetcher::default());
        let options =
            PetkitOptions::default().with_media_event_types(vec![RecordType::Feed]);
        let media = coordinator(Arc::clone(&fetcher), options);

        let eat = record(1, 1000);
        let feed = MediaRecord::new(DeviceId::new(1), RecordType::Feed, MediaType::Image, 2000);
        let snap = snapshot(vec![device_with_records(1, vec![eat, feed.clone()])]);

        media
            .refresh_media(&[DeviceId::new(1)].into_iter().collect(), &snap)
            .await;

        let downloads = fetcher.downloads.lock().clone();
        assert_eq!(downloads, vec![feed.key()]);
    }

    #[test]
    fn prune_removes_only_expired_date_dirs() {
        let root = tempfile::tempdir().unwrap();
        let device_dir = root.path().join("123");
        std::fs::create_dir_all(device_dir.join("20200101")).unwrap();
        std::fs::create_dir_all(device_dir.join("notadate")).unwrap();
        let today = Utc::now().format(DATE_DIR_FORMAT).to_string();
        std::fs::create_dir_all(device_dir.join(&today)).unwrap();

        let cutoff = Utc::now().date_naive() - chrono::Days::new(7);
        let removed = prune_older_than(root.path(), cutoff).unwrap();

        assert_eq!(removed, 1);
        assert!(!device_dir.join("20200101").exists());
        assert!(device_dir.join("notadate").exists());
        assert!(device_dir.join(&today).exists());
    }

    #[test]
    fn prune_disabled_when_retention_zero() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("123").join("20200101")).unwrap();

        let fetcher = Arc::new(FakeFetcher::default());
        let options = PetkitOptions::default()
            .with_media_retention_days(0)
            .with_media_path(root.path());
        let media = coordinator(fetcher, options);

        assert_eq!(media.prune_expired().unwrap(), 0);
        assert!(root.path().join("123").join("20200101").exists());
    }

    #[test]
    #[cfg(unix)]
    fn prune_continues_past_unreadable_device_dir() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let locked = root.path().join("111");
        std::fs::create_dir_all(locked.join("20200101")).unwrap();
        let sibling = root.path().join("222");
        std::fs::create_dir_all(sibling.join("20200101")).unwrap();

        // Make the first device's subtree unlistable
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let cutoff = Utc::now().date_naive() - chrono::Days::new(7);
        let result = prune_older_than(root.path(), cutoff);

        // Restore so the tempdir can clean up
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // The failing subtree is contained; the sibling is still pruned
        assert!(result.is_ok());
        assert!(!sibling.join("20200101").exists());
    }

    #[test]
    fn prune_missing_root_is_noop() {
        let cutoff = Utc::now().date_naive();
        let removed = prune_older_than(Path::new("/nonexistent/petkit-media"), cutoff).unwrap();
        assert_eq!(removed, 0);
    }
}

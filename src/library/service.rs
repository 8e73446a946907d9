//! Settings-driven scan lifecycle coordination.
//!
//! The service owns the background scan task: it observes the chosen
//! folder root, keeps at most one scan in flight, and replaces the
//! catalog snapshot only when a scan runs to completion. With no folder
//! root configured, refreshes load the content index wholesale instead
//! of walking a tree.

use std::sync::{Arc, Weak};

use {
    parking_lot::Mutex,
    tokio::{spawn, sync::broadcast::error::RecvError, task::JoinHandle},
    tracing::debug,
};

use crate::{
    config::settings::{SettingsEvent, SettingsStore},
    error::operational::{ErrorReporter, ResultExt},
    library::{catalog::SongCatalog, content_index::ContentIndex, scanner::LibraryScanner, song::Song},
};

/// Coordinates settings, scanner, and catalog.
pub struct LibraryService {
    /// Folder-walking scanner.
    scanner: LibraryScanner,
    /// Content index, doubling as the no-root catalog source.
    index: Arc<dyn ContentIndex>,
    /// Catalog receiving completed snapshots.
    catalog: Arc<SongCatalog>,
    /// Settings store observed for folder-root changes.
    settings: Arc<SettingsStore>,
    /// In-flight scan task, if any.
    scan_task: Mutex<Option<JoinHandle<()>>>,
    /// Settings observer task, if started.
    observer_task: Mutex<Option<JoinHandle<()>>>,
}

impl LibraryService {
    /// Creates a service over the given collaborators.
    ///
    /// # Arguments
    ///
    /// * `scanner` - Folder-walking scanner.
    /// * `index` - Content index shared with the scanner.
    /// * `catalog` - Catalog receiving completed snapshots.
    /// * `settings` - Settings store observed for folder-root changes.
    #[must_use]
    pub fn new(
        scanner: LibraryScanner,
        index: Arc<dyn ContentIndex>,
        catalog: Arc<SongCatalog>,
        settings: Arc<SettingsStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            scanner,
            index,
            catalog,
            settings,
            scan_task: Mutex::new(None),
            observer_task: Mutex::new(None),
        })
    }

    /// Runs an initial refresh and begins observing folder-root changes.
    ///
    /// The observer holds only a weak reference, so dropping every other
    /// handle to the service ends it.
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut settings_rx = self.settings.subscribe();

        let observer = spawn(async move {
            loop {
                match settings_rx.recv().await {
                    Ok(SettingsEvent::FolderRootChanged(root)) => {
                        debug!("Folder root changed to {root:?}, refreshing library");
                        match weak.upgrade() {
                            Some(service) => service.refresh(),
                            None => break,
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Settings observer lagged by {skipped} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        *self.observer_task.lock() = Some(observer);
        self.refresh();
    }

    /// Starts a background refresh, aborting any in-flight scan first.
    ///
    /// An aborted scan publishes nothing; the previous catalog snapshot
    /// stays in place until a refresh completes.
    pub fn refresh(self: &Arc<Self>) {
        let mut guard = self.scan_task.lock();
        if let Some(task) = guard.take() {
            task.abort();
        }

        let service = self.clone();
        *guard = Some(spawn(async move {
            service.catalog.set_scanning(true);

            let songs = match service.settings.folder_root() {
                Some(root) => service.scanner.scan(&root).await,
                None => service.load_from_index(),
            };

            service.catalog.replace(songs);
            service.catalog.set_scanning(false);
        }));
    }

    /// Aborts the observer and any in-flight scan.
    pub fn shutdown(&self) {
        if let Some(task) = self.observer_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.scan_task.lock().take() {
            task.abort();
        }
        self.catalog.set_scanning(false);
    }

    /// Loads every indexed music row, used when no folder root is chosen.
    fn load_from_index(&self) -> Vec<Song> {
        match self.index.all_tracks().add_context("loading index-wide catalog") {
            Ok(rows) => rows
                .iter()
                .map(|row| Song::from_indexed(row, &row.path))
                .collect(),
            Err(e) => {
                ErrorReporter::warn(&e, "library refresh");
                Vec::new()
            }
        }
    }
}

impl Drop for LibraryService {
    fn drop(&mut self) {
        if let Some(task) = self.scan_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.observer_task.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::write, sync::Arc};

    use {
        tempfile::tempdir,
        tokio::time::{Duration, timeout},
    };

    use crate::{
        config::settings::{MemorySettingsBackend, SettingsStore},
        error::domain::LibraryError,
        library::{
            catalog::{CatalogEvent, SongCatalog},
            content_index::{ContentIndex, IndexedTrack},
            folder_tree::FsFolderTree,
            power::{FixedPowerMonitor, PowerState},
            scanner::LibraryScanner,
            service::LibraryService,
        },
    };

    const TEST_TIMEOUT: Duration = Duration::from_millis(2000);

    /// Index with a fixed row set.
    struct StaticIndex {
        rows: Vec<IndexedTrack>,
    }

    impl ContentIndex for StaticIndex {
        fn all_tracks(&self) -> Result<Vec<IndexedTrack>, LibraryError> {
            Ok(self.rows.clone())
        }

        fn resolve_by_path(&self, path: &str) -> Option<IndexedTrack> {
            self.rows.iter().find(|row| row.path == path).cloned()
        }
    }

    fn service_with(
        rows: Vec<IndexedTrack>,
        settings: Arc<SettingsStore>,
    ) -> (Arc<LibraryService>, Arc<SongCatalog>) {
        let index: Arc<dyn ContentIndex> = Arc::new(StaticIndex { rows });
        let catalog = Arc::new(SongCatalog::new());
        let scanner = LibraryScanner::new(
            index.clone(),
            Arc::new(FsFolderTree),
            Arc::new(FixedPowerMonitor(PowerState::Normal)),
            None,
        );
        let service = LibraryService::new(scanner, index, catalog.clone(), settings);
        (service, catalog)
    }

    async fn wait_for_replaced(
        events: &mut tokio::sync::broadcast::Receiver<CatalogEvent>,
    ) -> usize {
        timeout(TEST_TIMEOUT, async {
            loop {
                if let CatalogEvent::Replaced(snapshot) =
                    events.recv().await.expect("catalog channel closed")
                {
                    return snapshot.len();
                }
            }
        })
        .await
        .expect("catalog was not replaced in time")
    }

    #[tokio::test]
    async fn test_refresh_scans_configured_folder_root() {
        let dir = tempdir().unwrap();
        write(dir.path().join("a.mp3"), b"x").unwrap();
        write(dir.path().join("b.flac"), b"x").unwrap();
        write(dir.path().join("notes.txt"), b"x").unwrap();

        let settings = Arc::new(SettingsStore::new(MemorySettingsBackend::default()).unwrap());
        settings
            .set_folder_root(Some(dir.path().to_string_lossy().to_string()))
            .unwrap();

        let (service, catalog) = service_with(Vec::new(), settings);
        let mut events = catalog.subscribe();

        service.refresh();
        assert_eq!(wait_for_replaced(&mut events).await, 2);
        service.shutdown();
    }

    #[tokio::test]
    async fn test_refresh_loads_index_when_no_root_is_chosen() {
        let rows = vec![
            IndexedTrack {
                id: 1,
                path: "/indexed/one.mp3".to_string(),
                title: Some("One".to_string()),
                artist: None,
                album: None,
                album_id: 1,
                duration_ms: 1000,
            },
            IndexedTrack {
                id: 2,
                path: "/indexed/two.mp3".to_string(),
                title: Some("Two".to_string()),
                artist: None,
                album: None,
                album_id: 1,
                duration_ms: 1000,
            },
        ];

        let settings = Arc::new(SettingsStore::new(MemorySettingsBackend::default()).unwrap());
        let (service, catalog) = service_with(rows, settings);
        let mut events = catalog.subscribe();

        service.refresh();
        assert_eq!(wait_for_replaced(&mut events).await, 2);

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot[0].locator, "/indexed/one.mp3");
        service.shutdown();
    }

    #[tokio::test]
    async fn test_folder_root_change_triggers_rescan() {
        let dir = tempdir().unwrap();
        write(dir.path().join("a.mp3"), b"x").unwrap();

        let settings = Arc::new(SettingsStore::new(MemorySettingsBackend::default()).unwrap());
        let (service, catalog) = service_with(Vec::new(), settings.clone());
        let mut events = catalog.subscribe();

        service.start();
        // Initial refresh with no root loads the (empty) index.
        assert_eq!(wait_for_replaced(&mut events).await, 0);

        settings
            .set_folder_root(Some(dir.path().to_string_lossy().to_string()))
            .unwrap();
        assert_eq!(wait_for_replaced(&mut events).await, 1);
        service.shutdown();
    }

    #[tokio::test]
    async fn test_scanning_flag_brackets_refresh() {
        let settings = Arc::new(SettingsStore::new(MemorySettingsBackend::default()).unwrap());
        let (service, catalog) = service_with(Vec::new(), settings);
        let mut events = catalog.subscribe();

        service.refresh();

        timeout(TEST_TIMEOUT, async {
            let mut saw_start = false;
            loop {
                match events.recv().await.expect("catalog channel closed") {
                    CatalogEvent::ScanStateChanged(true) => saw_start = true,
                    CatalogEvent::ScanStateChanged(false) => {
                        assert!(saw_start, "scan must start before it finishes");
                        break;
                    }
                    CatalogEvent::Replaced(_) => {}
                }
            }
        })
        .await
        .expect("scan state events not observed");
        service.shutdown();
    }
}

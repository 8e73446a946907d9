//! In-memory song catalog with derived views.
//!
//! The catalog is single-writer, multi-reader: a scan replaces the whole
//! snapshot, observers receive the replacement event, and every view
//! allocates a new list. Nothing mutates a published snapshot.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    parking_lot::RwLock,
    rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom},
    tokio::sync::broadcast::{Receiver, Sender, channel},
    tracing::debug,
};

use crate::library::song::Song;

/// Catalog change events.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    /// The snapshot was replaced wholesale.
    Replaced(Arc<Vec<Song>>),
    /// A scan started (`true`) or finished (`false`).
    ScanStateChanged(bool),
}

/// The in-memory list of discovered songs.
pub struct SongCatalog {
    /// Current snapshot, replaced wholesale on rescan.
    songs: RwLock<Arc<Vec<Song>>>,
    /// Whether a scan is currently running.
    scanning: AtomicBool,
    /// Broadcast channel for catalog change notifications.
    events_tx: Sender<CatalogEvent>,
}

impl Default for SongCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SongCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        let (events_tx, _) = channel(16);
        Self {
            songs: RwLock::new(Arc::new(Vec::new())),
            scanning: AtomicBool::new(false),
            events_tx,
        }
    }

    /// Subscribes to catalog change events.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.events_tx.subscribe()
    }

    /// Gets the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Song>> {
        self.songs.read().clone()
    }

    /// Number of songs in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.read().len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.read().is_empty()
    }

    /// Replaces the snapshot wholesale and notifies subscribers.
    pub fn replace(&self, songs: Vec<Song>) {
        debug!("Replacing catalog snapshot with {} songs", songs.len());
        let snapshot = Arc::new(songs);
        *self.songs.write() = snapshot.clone();
        let _ = self.events_tx.send(CatalogEvent::Replaced(snapshot));
    }

    /// Marks a scan as running or finished and notifies subscribers.
    pub fn set_scanning(&self, scanning: bool) {
        if self.scanning.swap(scanning, Ordering::SeqCst) != scanning {
            let _ = self.events_tx.send(CatalogEvent::ScanStateChanged(scanning));
        }
    }

    /// Whether a scan is currently running.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Songs not hidden by the block list.
    ///
    /// A song is hidden when its locator contains any blocked substring.
    /// Filtering is a view operation and idempotent; the snapshot is
    /// untouched.
    #[must_use]
    pub fn visible(&self, blocked: &BTreeSet<String>) -> Vec<Song> {
        self.snapshot()
            .iter()
            .filter(|song| !is_blocked(song, blocked))
            .cloned()
            .collect()
    }

    /// Visible songs grouped by parent folder, folder keys sorted.
    #[must_use]
    pub fn by_folder(&self, blocked: &BTreeSet<String>) -> BTreeMap<String, Vec<Song>> {
        let mut folders: BTreeMap<String, Vec<Song>> = BTreeMap::new();
        for song in self.visible(blocked) {
            folders
                .entry(song.parent_folder().to_string())
                .or_default()
                .push(song);
        }
        folders
    }

    /// A uniformly shuffled sample of the snapshot.
    ///
    /// Returns `min(count, len)` distinct songs; the snapshot order is
    /// untouched. Hosts use this for the home "mix" row.
    #[must_use]
    pub fn shuffled_subset(&self, count: usize) -> Vec<Song> {
        let mut songs: Vec<Song> = self.snapshot().to_vec();
        let mut rng = SmallRng::from_entropy();
        songs.shuffle(&mut rng);
        songs.truncate(count);
        songs
    }

    /// Case-insensitive title/artist search over visible songs.
    ///
    /// An empty query returns all visible songs.
    #[must_use]
    pub fn search(&self, query: &str, blocked: &BTreeSet<String>) -> Vec<Song> {
        let needle = query.to_lowercase();
        self.visible(blocked)
            .into_iter()
            .filter(|song| {
                needle.is_empty()
                    || song.title.to_lowercase().contains(&needle)
                    || song.artist.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Whether a song's locator contains any blocked substring.
fn is_blocked(song: &Song, blocked: &BTreeSet<String>) -> bool {
    blocked.iter().any(|folder| song.locator.contains(folder))
}

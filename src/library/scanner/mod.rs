//! Library scanner: folder traversal into catalog songs.
//!
//! A scan walks the user's granted folder tree, accepts entries by
//! declared audio content type, and resolves each accepted file against
//! the content index, falling back to filename-derived metadata on a
//! miss. The traversal throttles itself under power save and never
//! surfaces an error: a dead root yields an empty list, a broken entry
//! is logged and skipped.

use std::{future::Future, pin::Pin, sync::Arc};

use {
    tokio::time::sleep,
    tracing::{debug, info, warn},
};

use crate::library::{
    content_index::ContentIndex,
    folder_tree::{FolderNode, FolderTree},
    power::PowerMonitor,
    song::{Song, is_audio_type},
};

mod config;

pub use config::{ScannerConfig, TraversalPolicy};

/// Walks a folder root into a normalized song list.
pub struct LibraryScanner {
    /// Content index for locator-to-metadata resolution.
    index: Arc<dyn ContentIndex>,
    /// Folder tree access.
    tree: Arc<dyn FolderTree>,
    /// Power state source, sampled once per scan.
    power: Arc<dyn PowerMonitor>,
    /// Traversal configuration.
    config: ScannerConfig,
}

impl LibraryScanner {
    /// Creates a new scanner.
    ///
    /// # Arguments
    ///
    /// * `index` - Content index for metadata resolution.
    /// * `tree` - Folder tree access.
    /// * `power` - Power state source.
    /// * `config` - Optional traversal configuration.
    #[must_use]
    pub fn new(
        index: Arc<dyn ContentIndex>,
        tree: Arc<dyn FolderTree>,
        power: Arc<dyn PowerMonitor>,
        config: Option<ScannerConfig>,
    ) -> Self {
        Self {
            index,
            tree,
            power,
            config: config.unwrap_or_default(),
        }
    }

    /// Scans the folder root into a song list, in traversal order.
    ///
    /// Cancel-safe: dropping the future mid-scan publishes nothing.
    ///
    /// # Arguments
    ///
    /// * `root_handle` - The persisted folder root handle.
    ///
    /// # Returns
    ///
    /// The discovered songs; empty when the root cannot be resolved.
    pub async fn scan(&self, root_handle: &str) -> Vec<Song> {
        let Some(root) = self.tree.resolve_root(root_handle) else {
            warn!("Folder root unavailable, scan yields nothing: {root_handle}");
            return Vec::new();
        };

        let policy = self.config.policy_for(self.power.power_state());
        debug!("Scanning {root_handle} with {policy:?}");

        let mut songs = Vec::new();
        self.scan_folder(root.as_ref(), &policy, &mut songs).await;

        info!("Scan of {root_handle} found {} songs", songs.len());
        songs
    }

    /// Walks one directory level, descending depth-first in name order.
    fn scan_folder<'a>(
        &'a self,
        node: &'a dyn FolderNode,
        policy: &'a TraversalPolicy,
        songs: &'a mut Vec<Song>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let children = match node.children() {
                Ok(children) => children,
                Err(e) => {
                    debug!("Skipping unreadable folder: {e}");
                    return;
                }
            };

            let mut descended = 0usize;
            for child in children {
                if child.is_directory() {
                    if policy.dir_limit.is_some_and(|limit| descended >= limit) {
                        debug!("Descent cap reached, skipping {}", child.locator());
                        continue;
                    }
                    descended += 1;
                    self.scan_folder(child.as_ref(), policy, songs).await;
                } else if child
                    .content_type()
                    .is_some_and(|content_type| is_audio_type(&content_type))
                {
                    songs.push(self.resolve_song(child.as_ref()));
                    if songs.len() % policy.yield_every == 0 {
                        sleep(policy.yield_pause).await;
                    }
                }
            }
        })
    }

    /// Resolves one accepted file to a song, index row first.
    fn resolve_song(&self, node: &dyn FolderNode) -> Song {
        let locator = node.locator();
        match self.index.resolve_by_path(&locator) {
            Some(row) => Song::from_indexed(&row, &locator),
            None => {
                debug!("No index row for {locator}, using filename fallback");
                Song::fallback(&locator, &node.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        fs::{create_dir, create_dir_all, write},
        sync::Arc,
    };

    use tempfile::{TempDir, tempdir};

    use crate::{
        error::domain::LibraryError,
        library::{
            content_index::{ContentIndex, IndexedTrack},
            folder_tree::FsFolderTree,
            power::{FixedPowerMonitor, PowerState},
            scanner::LibraryScanner,
            song::{UNKNOWN_ARTIST, Song},
        },
    };

    /// Scripted index resolving only the rows it was given.
    #[derive(Default)]
    struct MemoryIndex {
        rows: HashMap<String, IndexedTrack>,
    }

    impl MemoryIndex {
        fn with_row(mut self, row: IndexedTrack) -> Self {
            self.rows.insert(row.path.clone(), row);
            self
        }
    }

    impl ContentIndex for MemoryIndex {
        fn all_tracks(&self) -> Result<Vec<IndexedTrack>, LibraryError> {
            let mut rows: Vec<IndexedTrack> = self.rows.values().cloned().collect();
            rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
            Ok(rows)
        }

        fn resolve_by_path(&self, path: &str) -> Option<IndexedTrack> {
            self.rows.get(path).cloned()
        }
    }

    fn scanner_over(index: MemoryIndex, power: PowerState) -> LibraryScanner {
        LibraryScanner::new(
            Arc::new(index),
            Arc::new(FsFolderTree),
            Arc::new(FixedPowerMonitor(power)),
            None,
        )
    }

    fn music_root() -> (TempDir, String) {
        let dir = tempdir().unwrap();
        let handle = dir.path().to_string_lossy().to_string();
        (dir, handle)
    }

    #[tokio::test]
    async fn test_unresolvable_root_yields_empty_list() {
        let scanner = scanner_over(MemoryIndex::default(), PowerState::Normal);
        let songs = scanner.scan("/nowhere/at/all").await;
        assert!(songs.is_empty());
    }

    #[tokio::test]
    async fn test_scan_counts_only_accepted_audio_types() {
        let (dir, handle) = music_root();
        create_dir_all(dir.path().join("one/two/three")).unwrap();
        write(dir.path().join("a.mp3"), b"x").unwrap();
        write(dir.path().join("one/b.flac"), b"x").unwrap();
        write(dir.path().join("one/two/c.ogg"), b"x").unwrap();
        write(dir.path().join("one/two/three/d.m4a"), b"x").unwrap();
        write(dir.path().join("one/two/three/e.opus"), b"x").unwrap();
        write(dir.path().join("cover.jpg"), b"x").unwrap();
        write(dir.path().join("one/notes.txt"), b"x").unwrap();
        write(dir.path().join("one/two/unknown.xyz"), b"x").unwrap();

        let scanner = scanner_over(MemoryIndex::default(), PowerState::Normal);
        let songs = scanner.scan(&handle).await;
        assert_eq!(songs.len(), 5);
    }

    #[tokio::test]
    async fn test_indexed_and_fallback_songs_in_traversal_order() {
        let (dir, handle) = music_root();
        create_dir(dir.path().join("sub")).unwrap();
        write(dir.path().join("a.mp3"), b"x").unwrap();
        write(dir.path().join("notes.txt"), b"x").unwrap();
        write(dir.path().join("sub/b.flac"), b"x").unwrap();

        let index = MemoryIndex::default().with_row(IndexedTrack {
            id: 1,
            path: dir.path().join("a.mp3").to_string_lossy().to_string(),
            title: Some("A".to_string()),
            artist: Some("X".to_string()),
            album: Some("Album".to_string()),
            album_id: 11,
            duration_ms: 200_000,
        });

        let scanner = scanner_over(index, PowerState::Normal);
        let songs = scanner.scan(&handle).await;

        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "A");
        assert_eq!(songs[0].artist, "X");
        assert_eq!(songs[0].duration_ms, 200_000);
        assert_eq!(songs[1].title, "b");
        assert_eq!(songs[1].artist, UNKNOWN_ARTIST);
        assert_eq!(songs[1].duration_ms, 0);
    }

    #[tokio::test]
    async fn test_fallback_ids_stable_across_scans() {
        let (dir, handle) = music_root();
        write(dir.path().join("b.flac"), b"x").unwrap();

        let scanner = scanner_over(MemoryIndex::default(), PowerState::Normal);
        let first = scanner.scan(&handle).await;
        let second = scanner.scan(&handle).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_power_save_descends_first_twenty_directories_only() {
        let (dir, handle) = music_root();
        for i in 0..25 {
            let sub = dir.path().join(format!("dir_{i:02}"));
            create_dir(&sub).unwrap();
            write(sub.join("track.mp3"), b"x").unwrap();
        }

        let throttled = scanner_over(MemoryIndex::default(), PowerState::PowerSave);
        let songs = throttled.scan(&handle).await;
        assert_eq!(songs.len(), 20);
        assert!(
            songs
                .iter()
                .all(|song: &Song| !song.locator.contains("dir_20")),
            "directories beyond the cap must not be descended"
        );

        let unrestricted = scanner_over(MemoryIndex::default(), PowerState::Normal);
        assert_eq!(unrestricted.scan(&handle).await.len(), 25);
    }

    #[tokio::test]
    async fn test_power_save_cap_applies_per_level() {
        let (dir, handle) = music_root();
        // A chain deeper than the per-level cap: each level has one
        // subdirectory, so power save must still reach the bottom.
        let mut path = dir.path().to_path_buf();
        for i in 0..22 {
            path = path.join(format!("level_{i:02}"));
        }
        create_dir_all(&path).unwrap();
        write(path.join("deep.mp3"), b"x").unwrap();

        let scanner = scanner_over(MemoryIndex::default(), PowerState::PowerSave);
        let songs = scanner.scan(&handle).await;
        assert_eq!(songs.len(), 1);
    }
}

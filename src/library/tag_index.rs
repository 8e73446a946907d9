//! Embedded-tag content index using the `lofty` crate.
//!
//! Hosts on platforms without a system media index can populate this
//! index themselves: feed it files, and it probes their embedded tags
//! into rows the scanner resolves like any other [`ContentIndex`].

use std::{collections::HashMap, path::Path};

use {
    lofty::{
        prelude::{AudioFile, TaggedFileExt},
        probe::Probe,
        tag::Accessor,
    },
    parking_lot::RwLock,
    tracing::debug,
};

use crate::{
    error::domain::LibraryError,
    library::content_index::{ContentIndex, IndexedTrack},
};

/// Mutable index state behind one lock.
#[derive(Debug, Default)]
struct TagIndexInner {
    /// Rows keyed by the exact locator they were indexed under.
    tracks: HashMap<String, IndexedTrack>,
    /// Album ids assigned per distinct album name.
    albums: HashMap<String, i64>,
    /// Next track id to assign.
    next_track_id: i64,
    /// Next album id to assign.
    next_album_id: i64,
}

/// A `ContentIndex` built from per-file tag probes.
#[derive(Debug)]
pub struct LocalTagIndex {
    inner: RwLock<TagIndexInner>,
}

impl Default for LocalTagIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTagIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TagIndexInner {
                tracks: HashMap::new(),
                albums: HashMap::new(),
                next_track_id: 1,
                next_album_id: 1,
            }),
        }
    }

    /// Probes a file's embedded tags and records it as an index row.
    ///
    /// Re-indexing a locator replaces its row but keeps its id. Rows for
    /// tagless-but-readable files carry `None` metadata fields; the
    /// scanner's placeholder rules apply downstream.
    ///
    /// # Arguments
    ///
    /// * `path` - The file to probe.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::TagProbe` if the file cannot be opened or
    /// parsed; callers log and skip, matching per-entry scan semantics.
    pub fn index_file(&self, path: &Path) -> Result<(), LibraryError> {
        let tagged_file = Probe::open(path)?.read()?;

        let primary_tag = tagged_file.primary_tag();
        let title = primary_tag.and_then(|tag| tag.title().map(|s| s.to_string()));
        let artist = primary_tag.and_then(|tag| tag.artist().map(|s| s.to_string()));
        let album = primary_tag.and_then(|tag| tag.album().map(|s| s.to_string()));
        let duration_ms =
            i64::try_from(tagged_file.properties().duration().as_millis()).unwrap_or(0);

        let locator = path.to_string_lossy().to_string();
        let mut inner = self.inner.write();

        let album_id = match album.as_deref() {
            Some(name) => {
                if let Some(&id) = inner.albums.get(name) {
                    id
                } else {
                    let id = inner.next_album_id;
                    inner.next_album_id += 1;
                    inner.albums.insert(name.to_string(), id);
                    id
                }
            }
            None => 0,
        };

        let id = match inner.tracks.get(&locator) {
            Some(existing) => existing.id,
            None => {
                let id = inner.next_track_id;
                inner.next_track_id += 1;
                id
            }
        };

        debug!("Indexed {locator} as track {id}");
        inner.tracks.insert(
            locator.clone(),
            IndexedTrack {
                id,
                path: locator,
                title,
                artist,
                album,
                album_id,
                duration_ms,
            },
        );
        Ok(())
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().tracks.len()
    }

    /// Whether the index holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().tracks.is_empty()
    }
}

impl ContentIndex for LocalTagIndex {
    fn all_tracks(&self) -> Result<Vec<IndexedTrack>, LibraryError> {
        let mut rows: Vec<IndexedTrack> = self.inner.read().tracks.values().cloned().collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn resolve_by_path(&self, path: &str) -> Option<IndexedTrack> {
        self.inner.read().tracks.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::write, path::Path};

    use tempfile::tempdir;

    use crate::{
        error::domain::LibraryError,
        library::{content_index::ContentIndex, tag_index::LocalTagIndex},
    };

    /// Writes a minimal valid PCM WAV file (16-bit mono, 44.1 kHz).
    fn write_test_wav(path: &Path, samples: u32) {
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&44_100u32.to_le_bytes());
        bytes.extend_from_slice(&88_200u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        write(path, bytes).unwrap();
    }

    #[test]
    fn test_index_file_rejects_unparseable_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        write(&path, b"definitely not audio").unwrap();

        let index = LocalTagIndex::new();
        assert!(matches!(
            index.index_file(&path),
            Err(LibraryError::TagProbe(_))
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_index_file_records_probed_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, 44_100);

        let index = LocalTagIndex::new();
        index.index_file(&path).unwrap();
        assert_eq!(index.len(), 1);

        let row = index
            .resolve_by_path(&path.to_string_lossy())
            .expect("row should resolve by exact path");
        assert_eq!(row.id, 1);
        assert_eq!(row.title, None);
        assert_eq!(row.album_id, 0);
        assert!((900..=1100).contains(&row.duration_ms));
    }

    #[test]
    fn test_reindexing_keeps_track_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, 4410);

        let index = LocalTagIndex::new();
        index.index_file(&path).unwrap();
        index.index_file(&path).unwrap();

        assert_eq!(index.len(), 1);
        let row = index.resolve_by_path(&path.to_string_lossy()).unwrap();
        assert_eq!(row.id, 1);
    }

    #[test]
    fn test_all_tracks_sorted_by_title() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("one.wav");
        let second = dir.path().join("two.wav");
        write_test_wav(&first, 441);
        write_test_wav(&second, 441);

        let index = LocalTagIndex::new();
        index.index_file(&second).unwrap();
        index.index_file(&first).unwrap();

        // Tagless rows share a `None` title, so order falls back to ids.
        let rows = index.all_tracks().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
    }

    #[test]
    fn test_resolve_unknown_path_is_none() {
        let index = LocalTagIndex::new();
        assert!(index.resolve_by_path("/nowhere.flac").is_none());
    }
}

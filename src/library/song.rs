//! Song model and audio content-type acceptance.
//!
//! A `Song` is immutable once constructed; the catalog replaces its whole
//! snapshot on rescan instead of mutating songs in place.

use serde::{Deserialize, Serialize};

use crate::library::content_index::IndexedTrack;

/// Placeholder artist for songs without indexed artist metadata.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Placeholder album for songs without indexed album metadata.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Content types accepted as audio by exact match.
///
/// Anything else is still accepted when it carries the `audio/` supertype
/// prefix; see [`is_audio_type`].
pub const AUDIO_MIME_TYPES: [&str; 6] = [
    "audio/mpeg",
    "audio/mp4",
    "audio/wav",
    "audio/flac",
    "audio/ogg",
    "audio/x-matroska",
];

/// Returns whether a declared content type is accepted as audio.
#[must_use]
pub fn is_audio_type(content_type: &str) -> bool {
    AUDIO_MIME_TYPES.contains(&content_type) || content_type.starts_with("audio/")
}

/// A single playable item in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Stable identifier, unique within a catalog snapshot.
    pub id: i64,
    /// Track title.
    pub title: String,
    /// Track artist.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// Index-side album identifier, absent for fallback songs.
    pub album_id: Option<i64>,
    /// Duration in milliseconds, 0 when unknown.
    pub duration_ms: i64,
    /// Playable content locator.
    pub locator: String,
    /// Artwork locator in the `albumart://` scheme, if known.
    pub artwork_locator: Option<String>,
}

impl Song {
    /// Builds a song from a content-index row.
    ///
    /// Missing title falls back to the locator's file stem; missing artist
    /// and album fall back to the placeholder strings. The artwork locator
    /// is derived from the row's album id in the `albumart://` scheme,
    /// which hosts map onto their artwork source.
    ///
    /// # Arguments
    ///
    /// * `row` - The matching content-index row.
    /// * `locator` - The playable locator the file was discovered under.
    #[must_use]
    pub fn from_indexed(row: &IndexedTrack, locator: &str) -> Self {
        let title = row
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .map_or_else(|| stem_of(locator).to_string(), ToString::to_string);

        Self {
            id: row.id,
            title,
            artist: non_empty_or(row.artist.as_deref(), UNKNOWN_ARTIST),
            album: non_empty_or(row.album.as_deref(), UNKNOWN_ALBUM),
            album_id: Some(row.album_id),
            duration_ms: row.duration_ms.max(0),
            locator: locator.to_string(),
            artwork_locator: Some(format!("albumart://{}", row.album_id)),
        }
    }

    /// Builds the filename-derived fallback for files the index misses.
    ///
    /// The id is the CRC-32 of the locator, so rescanning the same
    /// unindexed file yields the same identity. It is NOT stable across
    /// re-mounts that change the locator text.
    ///
    /// # Arguments
    ///
    /// * `locator` - The playable locator the file was discovered under.
    /// * `file_name` - The entry's file name, extension included.
    #[must_use]
    pub fn fallback(locator: &str, file_name: &str) -> Self {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };

        Self {
            id: i64::from(crc32fast::hash(locator.as_bytes())),
            title: stem.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            album_id: None,
            duration_ms: 0,
            locator: locator.to_string(),
            artwork_locator: None,
        }
    }

    /// The locator's parent-folder path, used by the by-folder view.
    #[must_use]
    pub fn parent_folder(&self) -> &str {
        match self.locator.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent,
            Some(_) => "/",
            None => "",
        }
    }
}

/// The file stem of a locator's last path segment.
fn stem_of(locator: &str) -> &str {
    let name = locator.rsplit('/').next().unwrap_or(locator);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// `value` when present and non-empty, otherwise `placeholder`.
fn non_empty_or(value: Option<&str>, placeholder: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

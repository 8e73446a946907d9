//! Music library management system.
//!
//! This module provides the foundation for building and holding the song
//! catalog: folder traversal, content-index resolution, the in-memory
//! catalog with its read views, and the service tying them to settings.

pub mod catalog;
pub mod content_index;
pub mod folder_tree;
pub mod power;
pub mod scanner;
pub mod service;
pub mod song;
pub mod tag_index;

pub use {
    catalog::{CatalogEvent, SongCatalog},
    content_index::{ContentIndex, IndexedTrack},
    folder_tree::{FolderNode, FolderTree, FsFolderTree},
    power::{FixedPowerMonitor, PowerMonitor, PowerState},
    scanner::{LibraryScanner, ScannerConfig, TraversalPolicy},
    service::LibraryService,
    song::{AUDIO_MIME_TYPES, Song, UNKNOWN_ALBUM, UNKNOWN_ARTIST, is_audio_type},
    tag_index::LocalTagIndex,
};

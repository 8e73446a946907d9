//! Lento - Folder-First Music Player Core
//!
//! The embeddable core of a calm, folder-first music player: it scans a
//! user-granted folder tree into an observable song catalog and bridges
//! playback commands onto a host-supplied player engine. Hosts bring the
//! platform pieces (content index, folder access, the engine itself) as
//! trait implementations and subscribe to state changes from the rest.

pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod playback;
pub mod state;

// Re-export key types for convenience
pub use {
    config::{LibrarySettings, SettingsEvent, SettingsStore, Theme},
    error::{LibraryError, SessionError},
    library::{
        ContentIndex, FolderTree, LibraryScanner, LibraryService, Song, SongCatalog,
    },
    playback::{ConnectionState, EngineConnector, PlayerEngine, SessionBridge},
    state::{SessionEvent, SessionState, SessionStateHolder},
};

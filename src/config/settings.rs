//! User preference management with an observe/set contract.
//!
//! The store keeps the three host-facing settings (chosen folder root,
//! blocked-folder set, theme) behind a narrow get/set/subscribe surface
//! and persists every change through a pluggable backend before the new
//! value becomes observable.

use std::{
    collections::BTreeSet,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::RwLock,
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tokio::sync::broadcast::{Receiver, Sender, channel},
    tracing::debug,
};

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
}

/// Theme preference persisted on behalf of the host shell.
///
/// The core never interprets this value; it only stores and republishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Force the light appearance.
    Light,
    /// Force the dark appearance.
    Dark,
    /// Follow the system appearance (default).
    #[default]
    System,
}

/// Serializable settings snapshot with default values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Persisted handle of the user's chosen music folder, if any.
    pub folder_root: Option<String>,
    /// Folder-path substrings whose songs are hidden from catalog views.
    pub blocked_folders: BTreeSet<String>,
    /// Theme preference.
    pub theme: Theme,
}

/// Settings change events, one per key.
#[derive(Debug, Clone)]
pub enum SettingsEvent {
    /// The chosen folder root changed.
    FolderRootChanged(Option<String>),
    /// The blocked-folder set changed.
    BlockListChanged(BTreeSet<String>),
    /// The theme preference changed.
    ThemeChanged(Theme),
}

/// Persistence seam for the settings snapshot.
///
/// The store calls `save` before committing a change, so a failing
/// backend leaves the observable value untouched.
pub trait SettingsBackend: Send + Sync {
    /// Loads the persisted snapshot, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if stored data exists but cannot be read.
    fn load(&self) -> Result<Option<LibrarySettings>, SettingsError>;

    /// Persists the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the snapshot cannot be written.
    fn save(&self, settings: &LibrarySettings) -> Result<(), SettingsError>;
}

/// JSON-file persistence at a host-supplied path.
#[derive(Debug)]
pub struct JsonSettingsBackend {
    /// Path to the settings file on disk.
    path: PathBuf,
}

impl JsonSettingsBackend {
    /// Creates a backend storing settings at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsBackend for JsonSettingsBackend {
    fn load(&self) -> Result<Option<LibrarySettings>, SettingsError> {
        if !self.path.exists() {
            debug!("No settings file at {:?}, starting from defaults", self.path);
            return Ok(None);
        }

        let contents = read_to_string(&self.path)?;
        Ok(Some(from_str(&contents)?))
    }

    fn save(&self, settings: &LibrarySettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }

        debug!("Saving settings to {:?}", self.path);
        let contents = to_string_pretty(settings)?;
        write(&self.path, contents)?;
        Ok(())
    }
}

/// In-memory persistence for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemorySettingsBackend {
    /// Last saved snapshot.
    stored: RwLock<Option<LibrarySettings>>,
}

impl SettingsBackend for MemorySettingsBackend {
    fn load(&self) -> Result<Option<LibrarySettings>, SettingsError> {
        Ok(self.stored.read().clone())
    }

    fn save(&self, settings: &LibrarySettings) -> Result<(), SettingsError> {
        *self.stored.write() = Some(settings.clone());
        Ok(())
    }
}

/// Observable settings store over a persistence backend.
pub struct SettingsStore {
    /// Current settings snapshot.
    settings: RwLock<LibrarySettings>,
    /// Persistence backend.
    backend: Box<dyn SettingsBackend>,
    /// Broadcast channel for settings change notifications.
    events_tx: Sender<SettingsEvent>,
}

impl SettingsStore {
    /// Creates a store, loading any persisted snapshot from the backend.
    ///
    /// # Arguments
    ///
    /// * `backend` - Persistence backend for the settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the backend holds data it cannot read.
    pub fn new(backend: impl SettingsBackend + 'static) -> Result<Self, SettingsError> {
        let settings = backend.load()?.unwrap_or_default();
        let (events_tx, _) = channel(16);

        Ok(Self {
            settings: RwLock::new(settings),
            backend: Box::new(backend),
            events_tx,
        })
    }

    /// Subscribes to settings change events.
    pub fn subscribe(&self) -> Receiver<SettingsEvent> {
        self.events_tx.subscribe()
    }

    /// Gets a clone of the full settings snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LibrarySettings {
        self.settings.read().clone()
    }

    /// Gets the chosen folder root handle, if any.
    #[must_use]
    pub fn folder_root(&self) -> Option<String> {
        self.settings.read().folder_root.clone()
    }

    /// Gets the blocked-folder set.
    #[must_use]
    pub fn blocked_folders(&self) -> BTreeSet<String> {
        self.settings.read().blocked_folders.clone()
    }

    /// Gets the theme preference.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.settings.read().theme
    }

    /// Sets the chosen folder root and notifies subscribers.
    ///
    /// Setting the already-current value is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if persisting fails; the observable value
    /// is left unchanged in that case.
    pub fn set_folder_root(&self, root: Option<String>) -> Result<(), SettingsError> {
        {
            let current = self.settings.read();
            if current.folder_root == root {
                return Ok(());
            }
        }

        let mut next = self.snapshot();
        next.folder_root = root.clone();
        self.commit(next)?;

        let _ = self.events_tx.send(SettingsEvent::FolderRootChanged(root));
        Ok(())
    }

    /// Sets the theme preference and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if persisting fails.
    pub fn set_theme(&self, theme: Theme) -> Result<(), SettingsError> {
        if self.settings.read().theme == theme {
            return Ok(());
        }

        let mut next = self.snapshot();
        next.theme = theme;
        self.commit(next)?;

        let _ = self.events_tx.send(SettingsEvent::ThemeChanged(theme));
        Ok(())
    }

    /// Adds a folder path to the block list and notifies subscribers.
    ///
    /// Adding an already-present path is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if persisting fails.
    pub fn add_blocked_folder(&self, path: &str) -> Result<(), SettingsError> {
        if self.settings.read().blocked_folders.contains(path) {
            return Ok(());
        }

        let mut next = self.snapshot();
        next.blocked_folders.insert(path.to_string());
        let blocked = next.blocked_folders.clone();
        self.commit(next)?;

        let _ = self.events_tx.send(SettingsEvent::BlockListChanged(blocked));
        Ok(())
    }

    /// Removes a folder path from the block list and notifies subscribers.
    ///
    /// Removing an absent path is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if persisting fails.
    pub fn remove_blocked_folder(&self, path: &str) -> Result<(), SettingsError> {
        if !self.settings.read().blocked_folders.contains(path) {
            return Ok(());
        }

        let mut next = self.snapshot();
        next.blocked_folders.remove(path);
        let blocked = next.blocked_folders.clone();
        self.commit(next)?;

        let _ = self.events_tx.send(SettingsEvent::BlockListChanged(blocked));
        Ok(())
    }

    /// Persists `next` and swaps it in as the current snapshot.
    fn commit(&self, next: LibrarySettings) -> Result<(), SettingsError> {
        self.backend.save(&next)?;
        *self.settings.write() = next;
        Ok(())
    }
}

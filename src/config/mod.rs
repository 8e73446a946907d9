//! User preferences, settings, and persistent state management.
//!
//! This module provides the observable settings store and its
//! persistence backends.

pub mod settings;

pub use settings::{
    JsonSettingsBackend, LibrarySettings, MemorySettingsBackend, SettingsBackend, SettingsError,
    SettingsEvent, SettingsStore, Theme,
};

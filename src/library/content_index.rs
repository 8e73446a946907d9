//! Content-index seam over the platform's media index.
//!
//! The scanner never talks to a concrete index; it resolves locators
//! through this trait. Hosts supply the platform adapter, while
//! [`crate::library::tag_index::LocalTagIndex`] covers hosts without one.

use crate::error::domain::LibraryError;

/// A raw music row as reported by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTrack {
    /// Index-assigned track identifier.
    pub id: i64,
    /// Locator the row was indexed under.
    pub path: String,
    /// Track title, if the index has one.
    pub title: Option<String>,
    /// Track artist, if the index has one.
    pub artist: Option<String>,
    /// Album name, if the index has one.
    pub album: Option<String>,
    /// Index-assigned album identifier.
    pub album_id: i64,
    /// Duration in milliseconds as reported by the index.
    pub duration_ms: i64,
}

/// Read-only access to a system-wide media index.
pub trait ContentIndex: Send + Sync {
    /// Returns every music row the index knows, title-ascending.
    ///
    /// Used to populate the catalog when no folder root is configured.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the index cannot be queried.
    fn all_tracks(&self) -> Result<Vec<IndexedTrack>, LibraryError>;

    /// Resolves a locator to its index row by exact match.
    ///
    /// `None` means the index has no row under this exact locator; the
    /// scanner then builds the filename fallback.
    fn resolve_by_path(&self, path: &str) -> Option<IndexedTrack>;
}

//! Folder-tree access seam over the host's granted storage.
//!
//! The scanner walks opaque nodes instead of paths so the same traversal
//! works over platform document trees and plain filesystems alike.
//! `FsFolderTree` is the filesystem implementation, with content types
//! derived from file extensions.

use std::{
    fs::read_dir,
    path::{Path, PathBuf},
};

use crate::error::domain::LibraryError;

/// A single entry in a granted folder tree.
pub trait FolderNode: Send + Sync {
    /// Whether this entry is a directory.
    fn is_directory(&self) -> bool;

    /// Lists this directory's entries in name order.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::ChildListing` if the entries cannot be read;
    /// the scanner logs and skips the directory.
    fn children(&self) -> Result<Vec<Box<dyn FolderNode>>, LibraryError>;

    /// The entry's declared content type, `None` when undeclared.
    fn content_type(&self) -> Option<String>;

    /// The playable locator for this entry.
    fn locator(&self) -> String;

    /// The entry's file name, extension included.
    fn name(&self) -> String;
}

/// Resolves persisted folder handles to traversable root nodes.
pub trait FolderTree: Send + Sync {
    /// Resolves a handle, or `None` when it is invalid or revoked.
    fn resolve_root(&self, handle: &str) -> Option<Box<dyn FolderNode>>;
}

/// Filesystem-backed folder tree; locators are plain paths.
///
/// Handles are absolute directory paths, optionally in `file://` form.
#[derive(Debug, Default)]
pub struct FsFolderTree;

impl FolderTree for FsFolderTree {
    fn resolve_root(&self, handle: &str) -> Option<Box<dyn FolderNode>> {
        let path = Path::new(handle.strip_prefix("file://").unwrap_or(handle));
        if path.is_dir() {
            Some(Box::new(FsNode {
                path: path.to_path_buf(),
            }))
        } else {
            None
        }
    }
}

/// A filesystem entry.
struct FsNode {
    path: PathBuf,
}

impl FolderNode for FsNode {
    fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    fn children(&self) -> Result<Vec<Box<dyn FolderNode>>, LibraryError> {
        let listing = read_dir(&self.path).map_err(|e| LibraryError::ChildListing {
            locator: self.locator(),
            reason: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|e| LibraryError::ChildListing {
                locator: self.locator(),
                reason: e.to_string(),
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| Box::new(FsNode { path }) as Box<dyn FolderNode>)
            .collect())
    }

    fn content_type(&self) -> Option<String> {
        if self.is_directory() {
            return None;
        }

        let extension = self.path.extension()?.to_string_lossy().to_lowercase();
        mime_for_extension(&extension).map(ToString::to_string)
    }

    fn locator(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Declared content type for a lowercase file extension.
fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "mp3" => Some("audio/mpeg"),
        "m4a" | "m4b" => Some("audio/mp4"),
        "wav" | "wave" => Some("audio/wav"),
        "flac" => Some("audio/flac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "aac" => Some("audio/aac"),
        "aif" | "aiff" => Some("audio/aiff"),
        "mka" => Some("audio/x-matroska"),
        "txt" => Some("text/plain"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

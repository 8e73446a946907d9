//! Domain-specific error types using `thiserror`.
//!
//! This module defines the main error enums for the two lento domains:
//! library scanning/indexing and the playback session.

use {lofty::error::LoftyError, thiserror::Error};

/// Library-related errors.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The chosen folder root could not be resolved to a readable directory.
    #[error("Folder root unavailable: {handle}")]
    RootUnavailable { handle: String },
    /// Listing the children of a folder failed.
    #[error("Failed to list folder {locator}: {reason}")]
    ChildListing { locator: String, reason: String },
    /// Probing a file for embedded tags failed.
    #[error("Tag probe failed: {0}")]
    TagProbe(#[from] LoftyError),
    /// Querying the content index failed.
    #[error("Content index query failed: {reason}")]
    IndexQuery { reason: String },
    /// Invalid path or metadata encountered during a scan.
    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },
}

/// Playback-session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Connecting to the playback engine failed.
    #[error("Engine connection failed: {reason}")]
    ConnectionFailed { reason: String },
    /// The engine rejected a transport command.
    #[error("Engine command failed: {command}: {reason}")]
    EngineCommand { command: String, reason: String },
    /// Invalid operation for the current connection state.
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },
}

#[cfg(test)]
mod tests {
    use crate::error::domain::{LibraryError, SessionError};

    #[test]
    fn test_library_error_display() {
        let root_error = LibraryError::RootUnavailable {
            handle: "/music".to_string(),
        };
        assert_eq!(root_error.to_string(), "Folder root unavailable: /music");

        let listing_error = LibraryError::ChildListing {
            locator: "/music/sub".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            listing_error.to_string(),
            "Failed to list folder /music/sub: permission denied"
        );

        let invalid_data_error = LibraryError::InvalidData {
            reason: "test reason".to_string(),
        };
        assert_eq!(invalid_data_error.to_string(), "Invalid data: test reason");
    }

    #[test]
    fn test_session_error_display() {
        let connection_error = SessionError::ConnectionFailed {
            reason: "engine process exited".to_string(),
        };
        assert_eq!(
            connection_error.to_string(),
            "Engine connection failed: engine process exited"
        );

        let command_error = SessionError::EngineCommand {
            command: "play".to_string(),
            reason: "no queue submitted".to_string(),
        };
        assert_eq!(
            command_error.to_string(),
            "Engine command failed: play: no queue submitted"
        );
    }
}

//! Centralized session state with reactive updates.
//!
//! This module provides the observable state container the playback
//! session publishes into, with thread-safe access and broadcast
//! notifications for observers.

pub mod session_state;

pub use session_state::{SessionEvent, SessionState, SessionStateHolder};

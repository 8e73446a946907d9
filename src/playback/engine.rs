//! Player-engine seam.
//!
//! The session bridge drives playback through this trait instead of a
//! concrete engine, so hosts plug in whatever backend they have. The
//! engine owns the playing queue; the bridge owns everything above it
//! (song lookup, observable state, timers).

use std::sync::Arc;

use {async_channel::Receiver, async_trait::async_trait};

use crate::error::domain::SessionError;

/// One queued item, pairing the engine-visible id with its locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Item id the engine echoes back in transition events.
    pub id: String,
    /// Playable content locator.
    pub locator: String,
}

/// Coarse engine playback states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No media prepared.
    Idle,
    /// Media is loading.
    Buffering,
    /// Media is prepared and playable.
    Ready,
    /// The queue played to its end.
    Ended,
}

/// Why the engine moved to another queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// Previous item finished.
    Auto,
    /// An explicit seek or skip landed here.
    Seek,
    /// The queue itself was replaced.
    QueueChange,
    /// The same item restarted on repeat.
    Repeat,
}

/// Events the engine pushes to its subscriber.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Play/pause state flipped.
    IsPlayingChanged(bool),
    /// The engine moved to another queue item, `None` past the queue end.
    MediaItemTransitioned {
        /// Id of the item now current, as given in [`QueueItem::id`].
        item_id: Option<String>,
        /// Why the transition happened.
        reason: TransitionReason,
    },
    /// The engine's coarse state changed.
    PlaybackStateChanged(EngineState),
}

/// A playback backend the session bridge can drive.
///
/// Commands are async and fallible; the bridge logs failures and keeps
/// going. Getters are instantaneous reads of the engine's own state.
#[async_trait]
pub trait PlayerEngine: Send + Sync {
    /// Replaces the queue and points the engine at `start_index`.
    ///
    /// # Arguments
    ///
    /// * `items` - The new queue, in play order.
    /// * `start_index` - Index of the item to make current.
    /// * `start_position_ms` - Position to start that item from.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the engine rejects the queue.
    async fn submit_queue(
        &self,
        items: Vec<QueueItem>,
        start_index: usize,
        start_position_ms: i64,
    ) -> Result<(), SessionError>;

    /// Prepares the current item for playback.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if preparation fails.
    async fn prepare(&self) -> Result<(), SessionError>;

    /// Starts or resumes playback.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the command fails.
    async fn play(&self) -> Result<(), SessionError>;

    /// Pauses playback.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the command fails.
    async fn pause(&self) -> Result<(), SessionError>;

    /// Seeks within the current item.
    ///
    /// # Arguments
    ///
    /// * `position_ms` - Target position in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the seek fails.
    async fn seek_to(&self, position_ms: i64) -> Result<(), SessionError>;

    /// Skips to the next queue item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the skip fails.
    async fn skip_next(&self) -> Result<(), SessionError>;

    /// Skips to the previous queue item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the skip fails.
    async fn skip_previous(&self) -> Result<(), SessionError>;

    /// Sets the playback volume, 0.0 silent through 1.0 full.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EngineCommand` if the command fails.
    async fn set_volume(&self, volume: f32) -> Result<(), SessionError>;

    /// Current position in the current item, in milliseconds.
    fn position_ms(&self) -> i64;

    /// Duration of the current item in milliseconds, 0 or less when unknown.
    fn duration_ms(&self) -> i64;

    /// Whether playback is running.
    fn is_playing(&self) -> bool;

    /// The engine's coarse state.
    fn playback_state(&self) -> EngineState;

    /// Whether a next queue item exists.
    fn has_next(&self) -> bool;

    /// Whether a previous queue item exists.
    fn has_previous(&self) -> bool;

    /// Returns the engine's event stream.
    ///
    /// The bridge holds exactly one receiver; events are not broadcast.
    fn subscribe(&self) -> Receiver<EngineEvent>;
}

/// Establishes a session with a player engine.
///
/// Connection is asynchronous and may fail; the bridge reports failure
/// and stays disconnected rather than retrying on its own.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    /// Connects and returns a handle to the engine.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConnectionFailed` when no engine is
    /// reachable.
    async fn connect(&self) -> Result<Arc<dyn PlayerEngine>, SessionError>;
}

//! Observable playback session state.
//!
//! This module provides the `SessionStateHolder` container that the
//! session bridge publishes into and observers subscribe to. Fields that
//! belong together change together: progress updates carry position and
//! duration in a single event so observers never see them torn.

use {
    parking_lot::RwLock,
    tokio::sync::broadcast::{Receiver, Sender, channel},
};

use crate::library::song::Song;

/// A point-in-time snapshot of the playback session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    /// Song the session currently centers on, `None` when idle.
    pub current_song: Option<Song>,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Playback position in milliseconds.
    pub position_ms: i64,
    /// Known duration in milliseconds, 0 until the engine reports one.
    pub duration_ms: i64,
    /// Whether a sleep timer is armed.
    pub sleep_timer_active: bool,
}

/// Session state change events.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Current song changed.
    SongChanged(Option<Song>),
    /// Play/pause state changed.
    PlayingChanged(bool),
    /// Position and duration advanced together.
    ProgressChanged {
        /// Playback position in milliseconds.
        position_ms: i64,
        /// Known duration in milliseconds.
        duration_ms: i64,
    },
    /// Sleep timer was armed or disarmed.
    SleepTimerChanged(bool),
}

/// Session state container with thread-safe access.
///
/// Writers update one field group at a time; each update takes the write
/// lock once and publishes exactly one event.
#[derive(Debug)]
pub struct SessionStateHolder {
    /// Current session snapshot.
    state: RwLock<SessionState>,
    /// Broadcast channel for state change notifications.
    events_tx: Sender<SessionEvent>,
}

impl Default for SessionStateHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateHolder {
    /// Creates a holder in the idle state.
    #[must_use]
    pub fn new() -> Self {
        let (events_tx, _) = channel(16);

        Self {
            state: RwLock::new(SessionState::default()),
            events_tx,
        }
    }

    /// Updates the current song and notifies subscribers.
    ///
    /// # Arguments
    ///
    /// * `song` - New current song, `None` when nothing is loaded.
    pub fn update_current_song(&self, song: Option<Song>) {
        self.state.write().current_song = song.clone();
        let _ = self.events_tx.send(SessionEvent::SongChanged(song));
    }

    /// Updates the play/pause state and notifies subscribers.
    ///
    /// # Arguments
    ///
    /// * `is_playing` - New play/pause state.
    pub fn update_is_playing(&self, is_playing: bool) {
        self.state.write().is_playing = is_playing;
        let _ = self.events_tx.send(SessionEvent::PlayingChanged(is_playing));
    }

    /// Updates position and duration together and notifies subscribers.
    ///
    /// # Arguments
    ///
    /// * `position_ms` - Playback position in milliseconds.
    /// * `duration_ms` - Known duration in milliseconds.
    pub fn update_progress(&self, position_ms: i64, duration_ms: i64) {
        {
            let mut state = self.state.write();
            state.position_ms = position_ms;
            state.duration_ms = duration_ms;
        }
        let _ = self.events_tx.send(SessionEvent::ProgressChanged {
            position_ms,
            duration_ms,
        });
    }

    /// Updates the sleep timer flag and notifies subscribers.
    ///
    /// # Arguments
    ///
    /// * `active` - Whether a sleep timer is armed.
    pub fn update_sleep_timer(&self, active: bool) {
        self.state.write().sleep_timer_active = active;
        let _ = self.events_tx.send(SessionEvent::SleepTimerChanged(active));
    }

    /// Subscribes to session state changes.
    ///
    /// # Returns
    ///
    /// A broadcast receiver for state change events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Gets a snapshot of the whole session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Gets the current song.
    #[must_use]
    pub fn current_song(&self) -> Option<Song> {
        self.state.read().current_song.clone()
    }

    /// Gets the play/pause state.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.read().is_playing
    }

    /// Gets the known duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.state.read().duration_ms
    }

    /// Gets the sleep timer flag.
    #[must_use]
    pub fn sleep_timer_active(&self) -> bool {
        self.state.read().sleep_timer_active
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        library::song::Song,
        state::session_state::{SessionEvent, SessionStateHolder},
    };

    fn test_song() -> Song {
        Song::fallback("/music/a.mp3", "a.mp3")
    }

    #[test]
    fn test_holder_starts_idle() {
        let holder = SessionStateHolder::new();
        let state = holder.snapshot();

        assert!(state.current_song.is_none());
        assert!(!state.is_playing);
        assert_eq!(state.position_ms, 0);
        assert_eq!(state.duration_ms, 0);
        assert!(!state.sleep_timer_active);
    }

    #[tokio::test]
    async fn test_update_current_song_publishes_and_stores() {
        let holder = SessionStateHolder::new();
        let mut events = holder.subscribe();

        holder.update_current_song(Some(test_song()));

        match events.recv().await.unwrap() {
            SessionEvent::SongChanged(Some(song)) => assert_eq!(song.title, "a"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(holder.current_song().unwrap().title, "a");
    }

    #[tokio::test]
    async fn test_update_progress_is_one_event() {
        let holder = SessionStateHolder::new();
        let mut events = holder.subscribe();

        holder.update_progress(1500, 200_000);

        match events.recv().await.unwrap() {
            SessionEvent::ProgressChanged {
                position_ms,
                duration_ms,
            } => {
                assert_eq!(position_ms, 1500);
                assert_eq!(duration_ms, 200_000);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events.try_recv().is_err(), "progress must be one event");

        let state = holder.snapshot();
        assert_eq!(state.position_ms, 1500);
        assert_eq!(state.duration_ms, 200_000);
    }

    #[tokio::test]
    async fn test_update_flags_publish() {
        let holder = SessionStateHolder::new();
        let mut events = holder.subscribe();

        holder.update_is_playing(true);
        holder.update_sleep_timer(true);

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::PlayingChanged(true)
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::SleepTimerChanged(true)
        ));
        assert!(holder.is_playing());
        assert!(holder.sleep_timer_active());
    }
}

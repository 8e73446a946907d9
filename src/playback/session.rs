//! Session bridge between callers and the player engine.
//!
//! The bridge accepts commands at any time but acts on them only while a
//! session is live: commands arriving earlier are dropped, never queued.
//! It publishes observable state optimistically where the caller already
//! knows the outcome (the song it just asked for) and reconciles against
//! engine events for everything the engine decides (transitions, play
//! state, timing).

use std::{collections::HashMap, sync::Arc};

use {
    async_channel::{Receiver, Sender, unbounded},
    parking_lot::{Mutex, RwLock},
    tokio::{
        spawn,
        task::JoinHandle,
        time::{Duration, interval},
    },
    tracing::{debug, info},
};

use crate::{
    error::operational::{ErrorReporter, ResultExt},
    library::song::Song,
    playback::{
        engine::{EngineConnector, EngineEvent, EngineState, PlayerEngine, QueueItem},
        sleep_timer::SleepTimer,
    },
    state::session_state::SessionStateHolder,
};

/// How often the live session samples engine timing.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Internal session control messages.
enum SessionCommand {
    /// Start playing a song within a queue context.
    PlaySong {
        /// The song the caller picked.
        song: Song,
        /// The queue it was picked from, in play order.
        queue: Vec<Song>,
    },
    /// Flip between play and pause.
    TogglePlayPause,
    /// Skip to the next queue item.
    SkipNext,
    /// Skip to the previous queue item.
    SkipPrevious,
    /// Seek within the current item.
    SeekTo(i64),
    /// Arm the sleep timer for this many minutes.
    StartSleepTimer(u64),
    /// Disarm the sleep timer.
    StopSleepTimer,
}

/// Where the bridge stands with its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session, none being established.
    Disconnected,
    /// Session establishment in flight.
    Connecting,
    /// Live session; commands are acted on.
    Connected,
}

/// Connection slot, holding the engine while live.
enum Connection {
    Disconnected,
    Connecting,
    Connected(Arc<dyn PlayerEngine>),
}

impl Connection {
    fn state(&self) -> ConnectionState {
        match self {
            Self::Disconnected => ConnectionState::Disconnected,
            Self::Connecting => ConnectionState::Connecting,
            Self::Connected(_) => ConnectionState::Connected,
        }
    }

    fn engine(&self) -> Option<Arc<dyn PlayerEngine>> {
        match self {
            Self::Connected(engine) => Some(engine.clone()),
            _ => None,
        }
    }
}

/// Bridge from caller commands to a player engine session.
///
/// Construction starts connecting immediately; `release` tears the
/// session down. All command methods are non-blocking sends into the
/// control loop.
pub struct SessionBridge {
    /// Current connection slot.
    connection: Arc<RwLock<Connection>>,
    /// Engine item id to song, rebuilt wholesale on every play request.
    lookup: Arc<RwLock<HashMap<String, Song>>>,
    /// Observable session state.
    state: Arc<SessionStateHolder>,
    /// Fade-out timer over the live engine.
    sleep_timer: Arc<SleepTimer>,
    /// Sender for internal control messages.
    control_tx: Sender<SessionCommand>,
    /// Connect task plus the loops it spawns.
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SessionBridge {
    /// Creates a bridge and starts connecting to the engine.
    ///
    /// # Arguments
    ///
    /// * `connector` - Engine connector to establish the session with.
    /// * `state` - Observable state the session publishes into.
    ///
    /// # Returns
    ///
    /// A new `SessionBridge` instance, connecting in the background.
    #[must_use]
    pub fn new(connector: Arc<dyn EngineConnector>, state: Arc<SessionStateHolder>) -> Self {
        let (control_tx, control_rx) = unbounded();
        let bridge = Self {
            connection: Arc::new(RwLock::new(Connection::Disconnected)),
            lookup: Arc::new(RwLock::new(HashMap::new())),
            sleep_timer: Arc::new(SleepTimer::new(state.clone())),
            state,
            control_tx,
            tasks: Arc::new(Mutex::new(Vec::new())),
        };

        bridge.start_connecting(connector);
        bridge.start_control_loop(control_rx);

        bridge
    }

    /// Starts playing `song` within `queue`, replacing the engine queue.
    ///
    /// # Arguments
    ///
    /// * `song` - The song to play.
    /// * `queue` - The queue it was picked from, in play order.
    pub fn play_song(&self, song: Song, queue: Vec<Song>) {
        if let Err(e) = self
            .control_tx
            .send_blocking(SessionCommand::PlaySong { song, queue })
        {
            debug!("SessionBridge: Failed to send PlaySong message: {e}");
        }
    }

    /// Flips between play and pause.
    pub fn toggle_play_pause(&self) {
        if let Err(e) = self.control_tx.send_blocking(SessionCommand::TogglePlayPause) {
            debug!("SessionBridge: Failed to send TogglePlayPause message: {e}");
        }
    }

    /// Skips to the next queue item, if any.
    pub fn skip_next(&self) {
        if let Err(e) = self.control_tx.send_blocking(SessionCommand::SkipNext) {
            debug!("SessionBridge: Failed to send SkipNext message: {e}");
        }
    }

    /// Skips to the previous queue item, if any.
    pub fn skip_previous(&self) {
        if let Err(e) = self.control_tx.send_blocking(SessionCommand::SkipPrevious) {
            debug!("SessionBridge: Failed to send SkipPrevious message: {e}");
        }
    }

    /// Seeks within the current item.
    ///
    /// # Arguments
    ///
    /// * `position_ms` - Target position in milliseconds.
    pub fn seek_to(&self, position_ms: i64) {
        if let Err(e) = self
            .control_tx
            .send_blocking(SessionCommand::SeekTo(position_ms))
        {
            debug!("SessionBridge: Failed to send SeekTo message: {e}");
        }
    }

    /// Arms the sleep timer, replacing any timer already running.
    ///
    /// # Arguments
    ///
    /// * `minutes` - Timer length in minutes.
    pub fn start_sleep_timer(&self, minutes: u64) {
        if let Err(e) = self
            .control_tx
            .send_blocking(SessionCommand::StartSleepTimer(minutes))
        {
            debug!("SessionBridge: Failed to send StartSleepTimer message: {e}");
        }
    }

    /// Disarms the sleep timer and restores full volume.
    pub fn stop_sleep_timer(&self) {
        if let Err(e) = self.control_tx.send_blocking(SessionCommand::StopSleepTimer) {
            debug!("SessionBridge: Failed to send StopSleepTimer message: {e}");
        }
    }

    /// Gets the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.read().state()
    }

    /// Tears the session down.
    ///
    /// Stops all background work, disarms the sleep timer, and drops the
    /// engine handle. Commands sent afterwards are dropped.
    pub fn release(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.sleep_timer.cancel();
        *self.connection.write() = Connection::Disconnected;
        debug!("SessionBridge: Released");
    }

    /// Starts the background connect task.
    fn start_connecting(&self, connector: Arc<dyn EngineConnector>) {
        let connection = self.connection.clone();
        let lookup = self.lookup.clone();
        let state = self.state.clone();
        let tasks = self.tasks.clone();

        let connect_task = spawn(async move {
            *connection.write() = Connection::Connecting;

            match connector.connect().await.add_context("connecting to player engine") {
                Ok(engine) => {
                    *connection.write() = Connection::Connected(engine.clone());
                    info!("SessionBridge: Session established");

                    let poll = spawn(Self::run_poll_loop(engine.clone(), state.clone()));
                    let events = spawn(Self::run_event_loop(engine, lookup, state));
                    let mut tasks = tasks.lock();
                    tasks.push(poll);
                    tasks.push(events);
                }
                Err(e) => {
                    *connection.write() = Connection::Disconnected;
                    ErrorReporter::error(&e, "session bridge");
                }
            }
        });

        self.tasks.lock().push(connect_task);
    }

    /// Starts the control loop processing session commands.
    fn start_control_loop(&self, control_rx: Receiver<SessionCommand>) {
        let connection = self.connection.clone();
        let lookup = self.lookup.clone();
        let state = self.state.clone();
        let sleep_timer = self.sleep_timer.clone();

        let control_task = spawn(async move {
            while let Ok(msg) = control_rx.recv().await {
                let Some(engine) = connection.read().engine() else {
                    debug!("SessionBridge: No live session, dropping command");
                    continue;
                };

                match msg {
                    SessionCommand::PlaySong { song, queue } => {
                        Self::handle_play_song(&engine, &lookup, &state, song, queue).await;
                    }
                    SessionCommand::TogglePlayPause => {
                        Self::handle_toggle_play_pause(&engine).await;
                    }
                    SessionCommand::SkipNext => {
                        if engine.has_next() {
                            if let Err(e) = engine.skip_next().await {
                                debug!("SessionBridge: Failed to skip next: {e}");
                            }
                        } else {
                            debug!("SessionBridge: At end of queue, no next item");
                        }
                    }
                    SessionCommand::SkipPrevious => {
                        if engine.has_previous() {
                            if let Err(e) = engine.skip_previous().await {
                                debug!("SessionBridge: Failed to skip previous: {e}");
                            }
                        } else {
                            debug!("SessionBridge: At start of queue, no previous item");
                        }
                    }
                    SessionCommand::SeekTo(position_ms) => {
                        // Range handling is the engine's concern.
                        if let Err(e) = engine.seek_to(position_ms).await {
                            debug!("SessionBridge: Failed to seek: {e}");
                        }
                    }
                    SessionCommand::StartSleepTimer(minutes) => {
                        sleep_timer.start(engine, minutes);
                    }
                    SessionCommand::StopSleepTimer => {
                        sleep_timer.stop(&engine).await;
                    }
                }
            }
        });

        self.tasks.lock().push(control_task);
    }

    /// Handles a play request: optimistic state, fresh lookup, new queue.
    async fn handle_play_song(
        engine: &Arc<dyn PlayerEngine>,
        lookup: &Arc<RwLock<HashMap<String, Song>>>,
        state: &Arc<SessionStateHolder>,
        song: Song,
        queue: Vec<Song>,
    ) {
        debug!(
            "SessionBridge: Playing {} within a queue of {}",
            song.title,
            queue.len()
        );

        // The caller already knows the song; publish before the engine
        // confirms so observers never wait on the round trip.
        state.update_current_song(Some(song.clone()));

        let start_index = queue
            .iter()
            .position(|entry| entry.id == song.id)
            .unwrap_or(0);

        {
            let mut map = lookup.write();
            map.clear();
            for entry in &queue {
                map.insert(entry.id.to_string(), entry.clone());
            }
        }

        let items = queue
            .iter()
            .map(|entry| QueueItem {
                id: entry.id.to_string(),
                locator: entry.locator.clone(),
            })
            .collect();

        if let Err(e) = engine.submit_queue(items, start_index, 0).await {
            debug!("SessionBridge: Failed to submit queue: {e}");
            return;
        }
        if let Err(e) = engine.prepare().await {
            debug!("SessionBridge: Failed to prepare: {e}");
            return;
        }
        if let Err(e) = engine.play().await {
            debug!("SessionBridge: Failed to play: {e}");
        }
    }

    /// Handles a play/pause flip against the engine's current state.
    async fn handle_toggle_play_pause(engine: &Arc<dyn PlayerEngine>) {
        let result = if engine.is_playing() {
            engine.pause().await
        } else {
            engine.play().await
        };
        if let Err(e) = result {
            debug!("SessionBridge: Failed to toggle playback: {e}");
        }
    }

    /// Samples engine timing on a fixed cadence while the session lives.
    ///
    /// Ticks publish only while the engine is playing or ready; position
    /// and duration go out as one event. A non-positive engine duration
    /// means unknown; the last known duration is kept.
    async fn run_poll_loop(engine: Arc<dyn PlayerEngine>, state: Arc<SessionStateHolder>) {
        let mut ticker = interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;

            if !engine.is_playing() && engine.playback_state() != EngineState::Ready {
                continue;
            }

            let position_ms = engine.position_ms().max(0);
            let engine_duration = engine.duration_ms();
            let duration_ms = if engine_duration > 0 {
                engine_duration
            } else {
                state.duration_ms()
            };
            state.update_progress(position_ms, duration_ms);
        }
    }

    /// Reconciles observable state against engine events.
    async fn run_event_loop(
        engine: Arc<dyn PlayerEngine>,
        lookup: Arc<RwLock<HashMap<String, Song>>>,
        state: Arc<SessionStateHolder>,
    ) {
        let events = engine.subscribe();
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::IsPlayingChanged(is_playing) => {
                    state.update_is_playing(is_playing);
                }
                EngineEvent::MediaItemTransitioned { item_id, reason } => {
                    debug!("SessionBridge: Engine moved to {item_id:?} ({reason:?})");
                    let song = item_id
                        .as_deref()
                        .and_then(|id| lookup.read().get(id).cloned());
                    state.update_current_song(song);
                }
                EngineEvent::PlaybackStateChanged(engine_state) => {
                    if engine_state == EngineState::Ready {
                        let duration_ms = engine.duration_ms();
                        if duration_ms > 0 {
                            state.update_progress(engine.position_ms().max(0), duration_ms);
                        }
                    }
                }
            }
        }
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

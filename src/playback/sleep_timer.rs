//! Sleep timer with a volume fade into pause.
//!
//! The timer waits out most of the requested window, then ramps volume
//! down in 100 equal steps so it reaches silence exactly when the window
//! ends, pauses, and restores full volume for the next session. Stopping
//! the timer always wins over an in-flight fade: the fade task checks its
//! active flag before every engine write.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use {
    parking_lot::Mutex,
    tokio::{
        spawn,
        task::JoinHandle,
        time::{Duration, sleep},
    },
    tracing::{debug, info},
};

use crate::{playback::engine::PlayerEngine, state::session_state::SessionStateHolder};

/// Fade window at the end of the timer, shortened for shorter timers.
const FADE_WINDOW_SECS: u64 = 300;

/// Number of equal volume steps across the fade window.
const FADE_STEPS: u32 = 100;

/// One-shot fade-out timer over a player engine.
pub struct SleepTimer {
    /// Observable state the armed flag is published into.
    state: Arc<SessionStateHolder>,
    /// Running fade task, if armed.
    task: Mutex<Option<JoinHandle<()>>>,
    /// Set while armed; cleared first on any stop path.
    active: Arc<AtomicBool>,
}

impl SleepTimer {
    /// Creates a disarmed timer.
    #[must_use]
    pub fn new(state: Arc<SessionStateHolder>) -> Self {
        Self {
            state,
            task: Mutex::new(None),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a timer is currently armed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Arms the timer, replacing any timer already running.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine to fade and finally pause.
    /// * `minutes` - Timer length; playback pauses this many minutes from now.
    pub fn start(&self, engine: Arc<dyn PlayerEngine>, minutes: u64) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        self.active.store(true, Ordering::Release);
        self.state.update_sleep_timer(true);
        info!("Sleep timer armed for {minutes} minutes");

        let (fade_start, step_pause) = fade_schedule(minutes);
        let active = self.active.clone();
        let state = self.state.clone();

        *task = Some(spawn(async move {
            // A replaced timer may have left the volume mid-fade.
            if let Err(e) = engine.set_volume(1.0).await {
                debug!("Sleep timer volume reset failed: {e}");
            }

            sleep(fade_start).await;

            for step in 1..=FADE_STEPS {
                sleep(step_pause).await;
                if !active.load(Ordering::Acquire) {
                    return;
                }
                let volume = 1.0 - step as f32 / FADE_STEPS as f32;
                if let Err(e) = engine.set_volume(volume).await {
                    debug!("Sleep timer fade step failed: {e}");
                }
            }

            if !active.swap(false, Ordering::AcqRel) {
                return;
            }
            if let Err(e) = engine.pause().await {
                debug!("Sleep timer pause failed: {e}");
            }
            if let Err(e) = engine.set_volume(1.0).await {
                debug!("Sleep timer volume restore failed: {e}");
            }
            state.update_sleep_timer(false);
            info!("Sleep timer elapsed, playback paused");
        }));
    }

    /// Disarms the timer and restores full volume.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine whose volume is restored.
    pub async fn stop(&self, engine: &Arc<dyn PlayerEngine>) {
        if self.cancel() {
            if let Err(e) = engine.set_volume(1.0).await {
                debug!("Sleep timer volume restore failed: {e}");
            }
            info!("Sleep timer stopped");
        }
    }

    /// Disarms the timer without touching the engine.
    ///
    /// Used when the engine is already gone. Returns whether a timer was
    /// actually armed.
    pub fn cancel(&self) -> bool {
        let was_active = self.active.swap(false, Ordering::AcqRel);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        if was_active {
            self.state.update_sleep_timer(false);
        }
        was_active
    }
}

impl Drop for SleepTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

/// Computes the pre-fade wait and per-step pause for a timer length.
///
/// The fade occupies the final [`FADE_WINDOW_SECS`] of the timer, or the
/// whole timer when it is shorter than the window. Volume reaches zero
/// exactly when the requested time elapses.
fn fade_schedule(minutes: u64) -> (Duration, Duration) {
    let total_secs = minutes * 60;
    let fade_start_secs = total_secs.saturating_sub(FADE_WINDOW_SECS);
    let fade_secs = total_secs - fade_start_secs;

    let step_pause = Duration::from_millis(fade_secs * 1000 / u64::from(FADE_STEPS));
    (Duration::from_secs(fade_start_secs), step_pause)
}

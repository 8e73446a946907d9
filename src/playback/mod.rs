//! Playback session management.
//!
//! Bridges caller commands onto a player engine behind an asynchronous
//! connection, publishing observable session state along the way.
//! Includes the engine seam, the session bridge, and the sleep timer.

pub mod engine;
pub mod session;
pub mod sleep_timer;


pub use {
    engine::{EngineConnector, EngineEvent, EngineState, PlayerEngine, QueueItem, TransitionReason},
    session::{ConnectionState, SessionBridge},
    sleep_timer::SleepTimer,
};

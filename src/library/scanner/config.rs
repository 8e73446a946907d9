//! Configuration for library scanning behavior.

use std::time::Duration;

use crate::library::power::PowerState;

/// Pacing and descent limits for one traversal, fixed at scan start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalPolicy {
    /// Accepted files between cooperative yields.
    pub yield_every: usize,
    /// Pause length at each yield point.
    pub yield_pause: Duration,
    /// Maximum subdirectories descended per level; `None` is unrestricted.
    pub dir_limit: Option<usize>,
}

/// Configuration for library scanning behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Policy applied on mains power or healthy battery.
    pub normal: TraversalPolicy,
    /// Policy applied under battery saver.
    pub power_save: TraversalPolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            normal: TraversalPolicy {
                yield_every: 50,
                yield_pause: Duration::from_millis(10),
                dir_limit: None,
            },
            power_save: TraversalPolicy {
                yield_every: 25,
                yield_pause: Duration::from_millis(20),
                dir_limit: Some(20),
            },
        }
    }
}

impl ScannerConfig {
    /// The policy matching a sampled power state.
    #[must_use]
    pub fn policy_for(&self, state: PowerState) -> TraversalPolicy {
        match state {
            PowerState::Normal => self.normal,
            PowerState::PowerSave => self.power_save,
        }
    }
}

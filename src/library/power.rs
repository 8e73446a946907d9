//! Device power-state seam for scan-policy selection.

/// Device power state, sampled once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Mains power or healthy battery (default).
    #[default]
    Normal,
    /// Battery saver engaged; scans throttle and cap their descent.
    PowerSave,
}

/// Reports the device power state.
pub trait PowerMonitor: Send + Sync {
    /// The current power state.
    fn power_state(&self) -> PowerState;
}

/// A monitor pinned to one state, for hosts without power telemetry
/// and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedPowerMonitor(pub PowerState);

impl PowerMonitor for FixedPowerMonitor {
    fn power_state(&self) -> PowerState {
        self.0
    }
}

//! Tracing subscriber installation for embedding hosts.
//!
//! The crate instruments itself with `tracing` but never installs a
//! subscriber on its own; hosts that want console output call [`init`]
//! once at startup. Tests may call it freely since repeat installs are
//! ignored.

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber honoring `RUST_LOG`.
///
/// Falls back to the `info` level when `RUST_LOG` is unset or invalid.
/// Calling this more than once (or after the host installed its own
/// subscriber) is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

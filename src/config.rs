//! # Simulator Configuration
//!
//! Simulator-wide defaults and the VM Driver invocation target.

use std::path::PathBuf;

/// Default starting balance for a freshly created account.
pub const DEFAULT_BALANCE: u128 = 1_000_000_000_000;

/// Default storage usage recorded on account creation and on reset.
pub const DEFAULT_STORAGE_USAGE: u64 = 60;

/// Default gas attached to a call when the caller does not specify one.
pub const DEFAULT_GAS: u64 = 300_000_000_000_000;

/// Simulator-wide configuration.
///
/// A small bag of defaults plus the external collaborator's launch
/// target, all overridable per simulator instance. Account starting
/// balance and storage usage are not here — they are fixed simulator-wide
/// constants (`DEFAULT_BALANCE`, `DEFAULT_STORAGE_USAGE`), not
/// per-instance knobs.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Path to the VM Driver executable.
    pub vm_driver_path: PathBuf,
    /// Gas attached to a call when unspecified.
    pub default_gas: u64,
    /// Block height surfaced to the VM Driver via `VMContext`.
    pub block_height: u64,
    /// Block timestamp (unix nanoseconds) surfaced via `VMContext`.
    pub block_timestamp: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            vm_driver_path: PathBuf::from("vm-driver"),
            default_gas: DEFAULT_GAS,
            block_height: 0,
            block_timestamp: 0,
        }
    }
}

//! LockOptions struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Options applied by a [`Locker`](crate::Locker) when acquiring markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Permission bits for newly created marker files (default: `0o600`).
    ///
    /// Existing markers keep their mode. The process umask still applies.
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,

    /// Whether missing parent directories are created (default: true).
    #[serde(default = "default_true")]
    pub create_parents: bool,

    /// Whether to query the kernel lock on an existing marker before opening
    /// it for writing (default: true).
    ///
    /// This only short-circuits the common contended case; the lock request
    /// itself stays authoritative.
    #[serde(default = "default_true")]
    pub probe_existing: bool,

    /// Whether to fsync the marker after recording the owner (default: false).
    #[serde(default)]
    pub sync_on_acquire: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            file_mode: default_file_mode(),
            create_parents: default_true(),
            probe_existing: default_true(),
            sync_on_acquire: false,
        }
    }
}

fn default_file_mode() -> u32 {
    0o600
}

fn default_true() -> bool {
    true
}

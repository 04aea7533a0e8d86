//! Kernel locking primitives.
//!
//! The lock protocol in [`crate::locks`] only needs three things from the
//! platform: take an exclusive whole-file lock without waiting, drop it, and
//! ask whether someone else holds it. [`LockBackend`] captures exactly that so
//! a different primitive can be swapped in without touching the protocol.

mod fcntl;

pub use fcntl::{FcntlBackend, FcntlMode};

use std::fs::File;
use std::io;

/// An advisory, exclusive, whole-file lock primitive.
pub trait LockBackend {
    /// Try to take an exclusive lock over the whole file without blocking.
    ///
    /// Returns `Ok(false)` when another holder already has a conflicting lock.
    /// Any other failure is returned as an error.
    fn try_lock_exclusive(&self, file: &File) -> io::Result<bool>;

    /// Drop a lock previously taken through this backend.
    fn unlock(&self, file: &File) -> io::Result<()>;

    /// Whether a lock held by someone other than `file` would conflict with an
    /// exclusive request. Does not take the lock.
    fn is_locked(&self, file: &File) -> io::Result<bool>;

    /// Whether locks belong to the whole process rather than to one open file.
    ///
    /// Such locks never conflict between two descriptors of one process, and
    /// closing any descriptor of the file drops them. The lock protocol then
    /// tracks held markers itself and never opens a second descriptor on one.
    fn is_process_scoped(&self) -> bool {
        false
    }
}

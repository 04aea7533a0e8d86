//! Outcome of a single acquisition attempt.

use super::handle::LockFile;
use crate::backend::{FcntlBackend, LockBackend};

/// Result of [`Locker::try_acquire`](crate::Locker::try_acquire).
///
/// Contention is an ordinary outcome here rather than an error; genuine I/O
/// failures are still reported through `Err`.
#[derive(Debug)]
pub enum TryAcquire<B: LockBackend = FcntlBackend> {
    /// The lock is now held by this handle.
    Acquired(LockFile<B>),
    /// Someone else holds the lock.
    Contended {
        /// Owner pid read from the marker, when readable.
        owner: Option<u32>,
    },
}

impl<B: LockBackend> TryAcquire<B> {
    pub fn is_acquired(&self) -> bool {
        matches!(self, TryAcquire::Acquired(_))
    }

    /// The handle, if the attempt acquired the lock.
    pub fn into_lock(self) -> Option<LockFile<B>> {
        match self {
            TryAcquire::Acquired(lock) => Some(lock),
            TryAcquire::Contended { .. } => None,
        }
    }
}

//! Error types for lockmark.
//!
//! Uses thiserror for derive macros. Contention is its own variant so callers
//! can back off on it without confusing it with a real I/O failure.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for lock operations.
///
/// I/O variants are split by the phase that produced them so an unlock
/// failure is never reported as a close or remove failure.
#[derive(Error, Debug)]
pub enum LockError {
    /// Another holder owns the kernel lock on the marker.
    #[error("lock '{}' is held by another process{}", .path.display(), owner_suffix(.owner))]
    AlreadyLocked { path: PathBuf, owner: Option<u32> },

    /// The parent directory of the marker could not be created.
    #[error("failed to create lock directory '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// The marker could not be opened or created.
    #[error("failed to open lock file '{}': {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// The kernel rejected the lock request for a reason other than contention.
    #[error("failed to lock '{}': {source}", .path.display())]
    Lock { path: PathBuf, source: io::Error },

    /// The owner pid could not be written into the marker.
    #[error("failed to record owner in lock file '{}': {source}", .path.display())]
    WriteOwner { path: PathBuf, source: io::Error },

    #[error("failed to unlock '{}': {source}", .path.display())]
    Unlock { path: PathBuf, source: io::Error },

    #[error("failed to close lock file '{}': {source}", .path.display())]
    Close { path: PathBuf, source: io::Error },

    #[error("failed to remove lock file '{}': {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },

    /// Lock options could not be read, parsed or validated.
    #[error("invalid lock options: {0}")]
    Config(String),
}

fn owner_suffix(owner: &Option<u32>) -> String {
    match owner {
        Some(pid) => format!(" (pid {})", pid),
        None => String::new(),
    }
}

impl LockError {
    /// Whether this error means "someone else holds the lock".
    pub fn is_already_locked(&self) -> bool {
        matches!(self, LockError::AlreadyLocked { .. })
    }

    /// The owner pid recorded in a contended marker, when it was readable.
    pub fn owner(&self) -> Option<u32> {
        match self {
            LockError::AlreadyLocked { owner, .. } => *owner,
            _ => None,
        }
    }

    /// The marker path the error refers to.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LockError::AlreadyLocked { path, .. }
            | LockError::CreateDir { path, .. }
            | LockError::Open { path, .. }
            | LockError::Lock { path, .. }
            | LockError::WriteOwner { path, .. }
            | LockError::Unlock { path, .. }
            | LockError::Close { path, .. }
            | LockError::Remove { path, .. } => Some(path),
            LockError::Config(_) => None,
        }
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

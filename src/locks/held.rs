//! Markers this process holds through process-scoped locks.
//!
//! With classic `fcntl` locks the kernel cannot tell two descriptors of one
//! process apart, and closing any of them drops the lock. Handles taken
//! through such a backend are recorded here by device and inode. Every
//! operation that opens a marker consults the set first and keeps the guard
//! while it has the marker open, so no second descriptor is ever opened on a
//! marker the process holds.

use std::collections::HashSet;
use std::fs::File;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard};

static HELD: LazyLock<Mutex<HashSet<MarkerId>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

/// Identity of a marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MarkerId {
    dev: u64,
    ino: u64,
}

impl MarkerId {
    pub(crate) fn of_file(file: &File) -> std::io::Result<Self> {
        let meta = file.metadata()?;
        Ok(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    /// Identity of whatever `path` names now, if anything.
    pub(crate) fn of_path(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }
}

/// Exclusive access to the set of held markers.
pub(crate) struct HeldMarkers {
    set: MutexGuard<'static, HashSet<MarkerId>>,
}

impl HeldMarkers {
    pub(crate) fn lock() -> Self {
        // A panic elsewhere cannot leave the set half-updated.
        let set = HELD.lock().unwrap_or_else(|poison| poison.into_inner());
        Self { set }
    }

    /// Whether `path` names a marker this process holds.
    pub(crate) fn holds_path(&self, path: &Path) -> bool {
        !self.set.is_empty() && MarkerId::of_path(path).is_some_and(|id| self.set.contains(&id))
    }

    pub(crate) fn insert(&mut self, id: MarkerId) {
        self.set.insert(id);
    }

    pub(crate) fn remove(&mut self, id: MarkerId) {
        self.set.remove(&id);
    }
}

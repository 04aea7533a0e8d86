//! Lock handle returned by a successful acquisition.

use super::held::{HeldMarkers, MarkerId};
use crate::backend::{FcntlBackend, LockBackend};
use crate::error::{LockError, Result};
use std::fs::{self, File};
use std::io;
use std::os::unix::io::IntoRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A held marker lock.
///
/// The handle owns the open marker and with it the kernel lock. Call
/// [`release`](LockFile::release) (or its alias [`close`](LockFile::close)) to
/// give the lock up and see any failure. When dropped without an explicit
/// release, the lock is released on a best-effort basis and failures are only
/// logged.
#[derive(Debug)]
pub struct LockFile<B: LockBackend = FcntlBackend> {
    path: PathBuf,
    /// `None` once released.
    file: Option<File>,
    backend: B,
    pid: u32,
    /// Set when the backend's locks are process-scoped.
    held: Option<MarkerId>,
}

impl<B: LockBackend> LockFile<B> {
    pub(super) fn new(
        path: PathBuf,
        file: File,
        backend: B,
        pid: u32,
        held: Option<MarkerId>,
    ) -> Self {
        Self {
            path,
            file: Some(file),
            backend,
            pid,
            held,
        }
    }

    /// Path of the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Process id recorded in the marker.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Release the lock.
    ///
    /// The marker is unlinked while the kernel lock is still held, then the
    /// lock is dropped and the descriptor closed. All three steps always run.
    /// The first failure is returned in the order unlock, close, remove; later
    /// ones are logged.
    pub fn release(mut self) -> Result<()> {
        self.teardown()
    }

    /// Alias of [`release`](LockFile::release).
    pub fn close(self) -> Result<()> {
        self.release()
    }

    fn teardown(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        let held = self.held.map(|id| (HeldMarkers::lock(), id));

        // Unlinking first means nobody can open this inode by path once the
        // kernel lock is gone.
        let removed = fs::remove_file(&self.path).map_err(|source| LockError::Remove {
            path: self.path.clone(),
            source,
        });
        let unlocked = self.backend.unlock(&file).map_err(|source| LockError::Unlock {
            path: self.path.clone(),
            source,
        });
        let closed = close_file(file).map_err(|source| LockError::Close {
            path: self.path.clone(),
            source,
        });
        if let Some((mut markers, id)) = held {
            markers.remove(id);
        }

        let mut failures = [unlocked, closed, removed]
            .into_iter()
            .filter_map(std::result::Result::err);
        match failures.next() {
            None => {
                debug!(lock = %self.path.display(), "released lock");
                Ok(())
            }
            Some(first) => {
                for other in failures {
                    warn!(error = %other, "additional failure while releasing lock");
                }
                Err(first)
            }
        }
    }
}

impl<B: LockBackend> Drop for LockFile<B> {
    fn drop(&mut self) {
        if self.file.is_some()
            && let Err(e) = self.teardown()
        {
            warn!(error = %e, "failed to release lock on drop");
        }
    }
}

/// Close a descriptor and report the result, which `File`'s drop discards.
fn close_file(file: File) -> io::Result<()> {
    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

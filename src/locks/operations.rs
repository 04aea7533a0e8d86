//! Lock acquisition and inspection operations.

use super::handle::LockFile;
use super::held::{HeldMarkers, MarkerId};
use super::hint::{read_owner, write_owner};
use super::types::TryAcquire;
use crate::backend::{FcntlBackend, LockBackend};
use crate::config::LockOptions;
use crate::error::{LockError, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Acquires and inspects marker locks.
///
/// A `Locker` only carries its options and backend; lock state lives in the
/// returned [`LockFile`] and on disk, so one locker can be shared freely. With
/// a process-scoped backend the process also remembers which markers it holds
/// (see [`LockBackend::is_process_scoped`]).
#[derive(Debug, Clone, Default)]
pub struct Locker<B = FcntlBackend> {
    options: LockOptions,
    backend: B,
}

impl Locker {
    /// A locker with default options and the platform's `fcntl` backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: LockBackend + Clone> Locker<B> {
    /// A locker with default options over a custom backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            options: LockOptions::default(),
            backend,
        }
    }

    /// Replace the options after validating them.
    pub fn with_options(mut self, options: LockOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Make a single attempt at taking the lock.
    ///
    /// Steps:
    /// 1. Report contention for a marker this process already holds
    /// 2. Check an existing marker and stop early if its kernel lock is held
    /// 3. Create missing parent directories
    /// 4. Open or create the marker for read/write
    /// 5. Request an exclusive non-blocking lock over the whole file
    /// 6. Check the locked file is still the one at `path`
    /// 7. Overwrite the content with this process's pid
    ///
    /// # Returns
    ///
    /// * `Ok(TryAcquire::Acquired(_))` - The lock is held by the returned handle
    /// * `Ok(TryAcquire::Contended { .. })` - Another holder has the lock
    /// * `Err(LockError)` - Directory creation, open, lock or write failure
    pub fn try_acquire<P: AsRef<Path>>(&self, path: P) -> Result<TryAcquire<B>> {
        let path = path.as_ref();
        let pid = std::process::id();

        // Held until the new handle is recorded, so no other thread opens the
        // marker in between.
        let mut held = HeldMarkers::lock();
        if held.holds_path(path) {
            log_in_use(path, Some(pid));
            return Ok(TryAcquire::Contended { owner: Some(pid) });
        }

        if self.options.probe_existing
            && let Some(contended) = self.check_existing(path)?
        {
            return Ok(contended);
        }

        if self.options.create_parents
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|source| LockError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(self.options.file_mode)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists || is_unopenable(&e, path) => {
                log_in_use(path, None);
                return Ok(TryAcquire::Contended { owner: None });
            }
            Err(source) => {
                return Err(LockError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let id = MarkerId::of_file(&file).map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        match self.backend.try_lock_exclusive(&file) {
            Ok(true) => {}
            Ok(false) => {
                let owner = read_owner(&file);
                log_in_use(path, owner);
                return Ok(TryAcquire::Contended { owner });
            }
            Err(source) => {
                return Err(LockError::Lock {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        // A releasing holder unlinks the marker before unlocking it, so the
        // inode we just locked may already be detached from the path.
        if MarkerId::of_path(path) != Some(id) {
            debug!(lock = %path.display(), "marker was replaced while locking");
            if let Err(e) = self.backend.unlock(&file) {
                warn!(lock = %path.display(), error = %e, "failed to unlock replaced marker");
            }
            return Ok(TryAcquire::Contended { owner: None });
        }

        if let Err(source) = write_owner(&file, pid, self.options.sync_on_acquire) {
            // Still locked, so removing the marker cannot hit another holder.
            if let Err(e) = fs::remove_file(path) {
                warn!(lock = %path.display(), error = %e, "failed to remove half-written marker");
            }
            if let Err(e) = self.backend.unlock(&file) {
                warn!(lock = %path.display(), error = %e, "failed to unlock half-written marker");
            }
            return Err(LockError::WriteOwner {
                path: path.to_path_buf(),
                source,
            });
        }

        let held_id = self.backend.is_process_scoped().then(|| {
            held.insert(id);
            id
        });

        debug!(lock = %path.display(), pid, "acquired lock");
        Ok(TryAcquire::Acquired(LockFile::new(
            path.to_path_buf(),
            file,
            self.backend.clone(),
            pid,
            held_id,
        )))
    }

    /// Take the lock or fail with [`LockError::AlreadyLocked`].
    pub fn acquire<P: AsRef<Path>>(&self, path: P) -> Result<LockFile<B>> {
        let path = path.as_ref();
        match self.try_acquire(path)? {
            TryAcquire::Acquired(lock) => Ok(lock),
            TryAcquire::Contended { owner } => Err(LockError::AlreadyLocked {
                path: path.to_path_buf(),
                owner,
            }),
        }
    }

    /// Whether a marker file is present at `path`. See [`exists`].
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        exists(path)
    }

    /// Owner pid recorded in the marker at `path`. See [`owner`].
    pub fn owner<P: AsRef<Path>>(&self, path: P) -> Result<Option<u32>> {
        owner(path)
    }

    /// Contended outcome when an existing marker's kernel lock is held.
    ///
    /// A missing marker is not contention; anything else unexpected is an
    /// error rather than a guess.
    fn check_existing(&self, path: &Path) -> Result<Option<TryAcquire<B>>> {
        let file = match open_marker(path)? {
            Marker::Missing => return Ok(None),
            Marker::Unreadable => {
                log_in_use(path, None);
                return Ok(Some(TryAcquire::Contended { owner: None }));
            }
            Marker::Open(file) => file,
        };

        let locked = self
            .backend
            .is_locked(&file)
            .map_err(|source| LockError::Lock {
                path: path.to_path_buf(),
                source,
            })?;
        if !locked {
            return Ok(None);
        }

        let owner = read_owner(&file);
        log_in_use(path, owner);
        Ok(Some(TryAcquire::Contended { owner }))
    }
}

/// Take the lock at `path` with a default [`Locker`].
pub fn acquire<P: AsRef<Path>>(path: P) -> Result<LockFile> {
    Locker::new().acquire(path)
}

/// Make a single attempt at the lock at `path` with a default [`Locker`].
pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<TryAcquire> {
    Locker::new().try_acquire(path)
}

/// Whether a marker file is present at `path`.
///
/// Only the file is checked, not its kernel lock, so the answer can be stale
/// by the time it is returned and a leftover marker from a crashed holder
/// still counts. A missing file is `Ok(false)`; an existing file this process
/// may not open is `Ok(true)`; other open failures are errors. The recorded
/// owner is logged when readable.
pub fn exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    let held = HeldMarkers::lock();
    if held.holds_path(path) {
        info!(lock = %path.display(), owner = std::process::id(), "lock in use");
        return Ok(true);
    }

    match open_marker(path)? {
        Marker::Missing => Ok(false),
        Marker::Unreadable => Ok(true),
        Marker::Open(file) => {
            if let Some(owner) = read_owner(&file) {
                info!(lock = %path.display(), owner, "lock in use");
            }
            Ok(true)
        }
    }
}

/// Owner pid recorded in the marker at `path`.
///
/// `Ok(None)` when there is no marker or its content is not a pid or cannot
/// be read.
pub fn owner<P: AsRef<Path>>(path: P) -> Result<Option<u32>> {
    let path = path.as_ref();
    let held = HeldMarkers::lock();
    if held.holds_path(path) {
        return Ok(Some(std::process::id()));
    }

    match open_marker(path)? {
        Marker::Open(file) => Ok(read_owner(&file)),
        Marker::Missing | Marker::Unreadable => Ok(None),
    }
}

/// What opening an existing marker read-only found.
enum Marker {
    Missing,
    /// Present but not openable by this process.
    Unreadable,
    Open(File),
}

fn open_marker(path: &Path) -> Result<Marker> {
    match File::open(path) {
        Ok(file) => Ok(Marker::Open(file)),
        Err(e) if is_missing(&e) => Ok(Marker::Missing),
        Err(e) if is_unopenable(&e, path) => Ok(Marker::Unreadable),
        Err(source) => Err(LockError::Open {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Errors meaning nothing can exist at the path.
fn is_missing(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ENOTDIR)
}

/// A marker exists at `path` but its permissions keep this process out,
/// typically one created by another user.
fn is_unopenable(err: &io::Error, path: &Path) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied && fs::symlink_metadata(path).is_ok()
}

fn log_in_use(path: &Path, owner: Option<u32>) {
    match owner {
        Some(pid) => info!(lock = %path.display(), owner = pid, "lock held by another process"),
        None => info!(lock = %path.display(), "lock held by another process"),
    }
}

//! POSIX `fcntl` record locks.
//!
//! Record locks are used instead of `flock(2)` because they are the lock type
//! NFS and CIFS clients forward to the server. Each request covers the whole
//! file (`l_start = 0`, `l_len = 0`), so the lock also spans bytes appended
//! later.

use super::LockBackend;
use std::fs::File;
use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;
use tracing::debug;

/// Which flavour of `fcntl` record lock to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcntlMode {
    /// Open file description locks (`F_OFD_SETLK`).
    ///
    /// Owned by the open file, so two handles in one process exclude each
    /// other and closing an unrelated descriptor does not drop the lock.
    #[cfg(target_os = "linux")]
    OpenFileDescription,

    /// Classic process-associated locks (`F_SETLK`).
    ///
    /// The kernel never reports a conflict between two descriptors of the
    /// same process, and closing any descriptor for the file drops the
    /// process's lock. [`Locker`](crate::Locker) compensates by remembering
    /// which markers this process holds: a second acquisition in the process
    /// is reported as contended, and `exists`/`owner` answer for such markers
    /// without opening them.
    Process,
}

#[cfg(target_os = "linux")]
const DEFAULT_MODE: FcntlMode = FcntlMode::OpenFileDescription;
#[cfg(not(target_os = "linux"))]
const DEFAULT_MODE: FcntlMode = FcntlMode::Process;

impl Default for FcntlMode {
    fn default() -> Self {
        DEFAULT_MODE
    }
}

impl FcntlMode {
    fn set_cmd(self) -> libc::c_int {
        match self {
            #[cfg(target_os = "linux")]
            FcntlMode::OpenFileDescription => libc::F_OFD_SETLK,
            FcntlMode::Process => libc::F_SETLK,
        }
    }

    fn get_cmd(self) -> libc::c_int {
        match self {
            #[cfg(target_os = "linux")]
            FcntlMode::OpenFileDescription => libc::F_OFD_GETLK,
            FcntlMode::Process => libc::F_GETLK,
        }
    }
}

/// [`LockBackend`] over `fcntl(2)` record locks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FcntlBackend {
    mode: FcntlMode,
}

impl FcntlBackend {
    pub fn new(mode: FcntlMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FcntlMode {
        self.mode
    }
}

/// A whole-file lock description of the given type.
fn whole_file(lock_type: libc::c_short) -> libc::flock {
    // l_pid must stay zero for OFD requests.
    let mut flock: libc::flock = unsafe { mem::zeroed() };
    flock.l_type = lock_type;
    flock.l_whence = libc::SEEK_SET as libc::c_short;
    flock.l_start = 0;
    flock.l_len = 0;
    flock
}

fn fcntl_lock(file: &File, cmd: libc::c_int, flock: &mut libc::flock) -> io::Result<()> {
    let ret = unsafe { libc::fcntl(file.as_raw_fd(), cmd, flock as *mut libc::flock) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Errno values `F_SETLK` uses to report a conflicting lock.
fn is_contention(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if code == libc::EAGAIN || code == libc::EACCES)
}

impl LockBackend for FcntlBackend {
    fn try_lock_exclusive(&self, file: &File) -> io::Result<bool> {
        debug!(fd = file.as_raw_fd(), mode = ?self.mode, "locking with fcntl");
        let mut flock = whole_file(libc::F_WRLCK as libc::c_short);
        match fcntl_lock(file, self.mode.set_cmd(), &mut flock) {
            Ok(()) => Ok(true),
            Err(e) if is_contention(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        debug!(fd = file.as_raw_fd(), mode = ?self.mode, "unlocking with fcntl");
        let mut flock = whole_file(libc::F_UNLCK as libc::c_short);
        fcntl_lock(file, self.mode.set_cmd(), &mut flock)
    }

    fn is_locked(&self, file: &File) -> io::Result<bool> {
        let mut flock = whole_file(libc::F_WRLCK as libc::c_short);
        fcntl_lock(file, self.mode.get_cmd(), &mut flock)?;
        Ok(flock.l_type != libc::F_UNLCK as libc::c_short)
    }

    fn is_process_scoped(&self) -> bool {
        self.mode == FcntlMode::Process
    }
}

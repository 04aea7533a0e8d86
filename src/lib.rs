//! lockmark: cross-process mutual exclusion through fcntl-locked marker files.
//!
//! A lock is a small text file at a caller-chosen path. Acquiring it opens
//! (or creates) the file, places an exclusive whole-file `fcntl` record lock on
//! it, and writes the holder's process id into it. Releasing unlinks the file,
//! drops the kernel lock and closes the descriptor.
//!
//! The file is only a hint. The kernel lock is what decides ownership, so a
//! marker left behind by a crashed process never blocks the next caller.
//!
//! ```no_run
//! let lock = lockmark::acquire("/tmp/build.lock")?;
//! // ... exclusive section ...
//! lock.release()?;
//! # Ok::<(), lockmark::LockError>(())
//! ```

#[cfg(not(unix))]
compile_error!("lockmark requires a Unix-like platform with fcntl record locks");

pub mod backend;
pub mod config;
pub mod error;
pub mod locks;

pub use backend::{FcntlBackend, FcntlMode, LockBackend};
pub use config::LockOptions;
pub use error::{LockError, Result};
pub use locks::{LockFile, Locker, TryAcquire, acquire, exists, owner, try_acquire};

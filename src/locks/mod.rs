//! Marker-file locking.
//!
//! # Lock Files
//!
//! A lock is a text file at a caller-supplied path holding the decimal pid of
//! its holder followed by a newline. New markers are created with mode `0600`
//! unless [`LockOptions`](crate::LockOptions) says otherwise; missing parent
//! directories are created.
//!
//! # Authority
//!
//! An exclusive `fcntl` record lock over the whole file decides who holds the
//! lock. File presence and content are hints only: a marker left behind by a
//! crashed process carries no kernel lock (the kernel drops it with the
//! descriptor), so the next acquisition simply takes it over and rewrites the
//! pid.
//!
//! # Handles
//!
//! A successful acquisition returns a [`LockFile`]. Releasing it unlinks the
//! marker, drops the kernel lock and closes the descriptor. Dropping it
//! without releasing does the same on a best-effort basis.

mod handle;
mod held;
mod hint;
mod operations;
mod types;


// Re-export public API
pub use handle::LockFile;
pub use operations::{Locker, acquire, exists, owner, try_acquire};
pub use types::TryAcquire;

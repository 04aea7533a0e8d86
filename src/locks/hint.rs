//! Owner hint stored in marker files.
//!
//! A marker holds the decimal pid of its current (or last) holder followed by
//! a newline. The hint is only ever used for diagnostics: unreadable or
//! malformed content yields `None` and never fails an operation.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

/// Longest content worth reading for a pid line.
const MAX_OWNER_LEN: usize = 64;

/// Marker content for the given pid.
pub(crate) fn format_owner(pid: u32) -> String {
    format!("{}\n", pid)
}

/// Parse the owner pid from marker content.
pub(crate) fn parse_owner(content: &str) -> Option<u32> {
    content.lines().next()?.trim().parse().ok()
}

/// Best-effort read of the owner pid from the start of an open marker.
pub(crate) fn read_owner(file: &File) -> Option<u32> {
    let mut buf = [0u8; MAX_OWNER_LEN];
    let n = file.read_at(&mut buf, 0).ok()?;
    parse_owner(std::str::from_utf8(&buf[..n]).ok()?)
}

/// Replace the marker content with the owner line for `pid`.
///
/// Writes from offset zero and truncates, so a longer line left by a previous
/// holder does not survive.
pub(crate) fn write_owner(file: &File, pid: u32, sync: bool) -> io::Result<()> {
    let content = format_owner(pid);
    file.write_all_at(content.as_bytes(), 0)?;
    file.set_len(content.len() as u64)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

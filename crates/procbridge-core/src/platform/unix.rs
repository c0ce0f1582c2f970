//! # POSIX Queries
//!
//! Queries that work the same on every Unix-like target, plus the record
//! helpers the Linux and macOS backends share.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::channel::ErrorChannel;
use crate::config;
use crate::error::Result;
use crate::format::{build_list, build_named_list, Arg};
use crate::kernel_string::query_kernel_string;
use crate::record::Record;
use crate::types::ProcessId;

/// Whether a process exists, as a one-field `"b"` record.
///
/// Uses `kill(pid, 0)`: `EPERM` means the process exists but belongs to
/// someone else. pid 0 is the kernel's and always exists.
///
/// ## Errors
///
/// - `InvalidArgument`: pid does not fit in a `pid_t`
/// - `System`: any `kill` failure other than `ESRCH` / `EPERM`
pub fn pid_exists(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    if pid.0 == 0 {
        return build_list("b", vec![Arg::from(true)]);
    }
    let raw = pid.as_pid_t()?;

    // SAFETY: signal 0 performs the permission and existence checks only.
    let rc = unsafe { libc::kill(raw, 0) };
    let exists = if rc == 0 {
        true
    } else {
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => false,
            Some(libc::EPERM) => true,
            _ => {
                channel.set_from_system_error(&err);
                return channel.throw_current();
            }
        }
    };
    build_list("b", vec![Arg::from(exists)])
}

/// Resolve a symbolic link to its target text.
///
/// ## Errors
///
/// - `NotFound`: the link does not exist or has an empty target
/// - `System`: any other `readlink` failure, or a path containing NUL
/// - `TooLarge`: the target outgrew the configured cap
pub fn readlink_string(channel: &mut ErrorChannel, path: &Path) -> Result<String>
{
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        channel.set_from_errno(libc::EINVAL);
        return channel.throw_current();
    };

    query_kernel_string(channel, config::get().max_kernel_string, |buf| {
        // SAFETY: `c_path` is NUL-terminated and `buf` is writable for
        // `buf.len()` bytes.
        let r = unsafe { libc::readlink(c_path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
        usize::try_from(r).map_err(|_| io::Error::last_os_error())
    })
}

/// Resolve a symbolic link, as a one-field `"s"` record.
///
/// ## Errors
///
/// See [`readlink_string`].
pub fn readlink(channel: &mut ErrorChannel, path: &Path) -> Result<Record>
{
    let target = readlink_string(channel, path)?;
    build_list("s", vec![Arg::from(target.as_str())])
}

/// Split a NUL-separated block into strings.
///
/// A single trailing NUL does not produce an empty last entry.
pub(crate) fn split_nul(bytes: &[u8]) -> Vec<String>
{
    let bytes = bytes.strip_suffix(b"\0").unwrap_or(bytes);
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes.split(|&b| b == 0).map(|s| String::from_utf8_lossy(s).into_owned()).collect()
}

/// Unnamed record with one text field per item.
pub(crate) fn text_list(items: &[String]) -> Result<Record>
{
    build_list(&"s".repeat(items.len()), items.iter().map(|s| Arg::from(s.as_str())).collect())
}

/// Named record of `NAME=value` entries.
///
/// Entries without `=` and entries with an empty name are skipped.
pub(crate) fn environ_record(entries: &[String]) -> Result<Record>
{
    let pairs: Vec<(&str, &str)> = entries
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    let names: Vec<&str> = pairs.iter().map(|(name, _)| *name).collect();
    let values = pairs.iter().map(|(_, value)| Arg::from(*value)).collect();
    build_named_list(&"s".repeat(pairs.len()), &names, values)
}

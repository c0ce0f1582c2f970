//! # Linux Queries
//!
//! Process attributes read from `/proc`.
//!
//! - `/proc/<pid>/exe` and `/proc/<pid>/cwd` are symbolic links. Files under
//!   `/proc` report a size of zero, so they are resolved with the growing
//!   buffer protocol from [`kernel_string`](crate::kernel_string).
//! - `/proc/<pid>/cmdline` and `/proc/<pid>/environ` are NUL-separated blocks.
//!
//! See: [proc(5) man page](https://man7.org/linux/man-pages/man5/proc.5.html)

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::trace;

use super::unix::{environ_record, readlink_string, split_nul, text_list};
use crate::channel::ErrorChannel;
use crate::error::Result;
use crate::format::{build_list, Arg};
use crate::record::Record;
use crate::types::ProcessId;

fn proc_path(pid: ProcessId, entry: &str) -> PathBuf
{
    PathBuf::from(format!("/proc/{pid}/{entry}"))
}

fn read_proc_file(channel: &mut ErrorChannel, pid: ProcessId, entry: &str) -> Result<Vec<u8>>
{
    let path = proc_path(pid, entry);
    trace!(path = %path.display(), "reading proc file");
    fs::read(&path).or_else(|err| {
        channel.set_from_system_error(&err);
        channel.throw_current()
    })
}

/// All pids listed in `/proc`, ascending, as `"I"` fields.
///
/// ## Errors
///
/// `System` if `/proc` cannot be read.
pub fn pids(channel: &mut ErrorChannel) -> Result<Record>
{
    let entries = match fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(err) => {
            channel.set_from_system_error(&err);
            return channel.throw_current();
        }
    };

    let mut pids: Vec<u32> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.file_name().to_str().and_then(|name| name.parse::<u32>().ok()))
        .collect();
    pids.sort_unstable();

    build_list(&"I".repeat(pids.len()), pids.into_iter().map(Arg::from).collect())
}

/// Executable path of a process, as a one-field `"s"` record.
///
/// ## Errors
///
/// - `NotFound`: no such process, or a kernel thread without an executable
/// - `System`: e.g. `EACCES` for another user's process
pub fn proc_exe(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let exe = readlink_string(channel, &proc_path(pid, "exe"))?;
    build_list("s", vec![Arg::from(exe.as_str())])
}

/// Working directory of a process, as a one-field `"s"` record.
///
/// ## Errors
///
/// Same as [`proc_exe`].
pub fn proc_cwd(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let cwd = readlink_string(channel, &proc_path(pid, "cwd"))?;
    build_list("s", vec![Arg::from(cwd.as_str())])
}

/// Command line of a process, one `"s"` field per argument.
///
/// Zombies and kernel threads have an empty command line and yield an empty
/// record.
///
/// ## Errors
///
/// `NotFound` / `System` if the file cannot be read.
pub fn proc_cmdline(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let raw = read_proc_file(channel, pid, "cmdline")?;
    text_list(&split_nul(&raw))
}

/// Environment of a process, as a named record `NAME -> value`.
///
/// ## Errors
///
/// `NotFound` / `System` if the file cannot be read.
pub fn proc_environ(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let raw = read_proc_file(channel, pid, "environ")?;
    environ_record(&split_nul(&raw))
}

fn sysconf(channel: &mut ErrorChannel, name: libc::c_int) -> Result<Record>
{
    // SAFETY: errno is thread-local and sysconf has no memory-safety
    // preconditions.
    let value = unsafe {
        *libc::__errno_location() = 0;
        libc::sysconf(name)
    };
    if value == -1 {
        // -1 with errno untouched means the limit is indeterminate.
        sysconf_failed(channel, name, io::Error::last_os_error().raw_os_error().unwrap_or(0));
        return channel.throw_current();
    }
    build_list("l", vec![Arg::Long(i64::from(value))])
}

fn sysconf_failed(channel: &mut ErrorChannel, name: libc::c_int, errno: i32)
{
    if errno == 0 {
        channel.set_formatted(format!("System error: sysconf({name}) is indeterminate"));
    } else {
        channel.set_from_errno(errno);
    }
}

/// Clock ticks per second, as a one-field `"l"` record.
///
/// ## Errors
///
/// `System` if `sysconf` fails.
pub fn linux_clk_tck(channel: &mut ErrorChannel) -> Result<Record>
{
    sysconf(channel, libc::_SC_CLK_TCK)
}

/// Memory page size in bytes, as a one-field `"l"` record.
///
/// ## Errors
///
/// `System` if `sysconf` fails.
pub fn linux_pagesize(channel: &mut ErrorChannel) -> Result<Record>
{
    sysconf(channel, libc::_SC_PAGESIZE)
}

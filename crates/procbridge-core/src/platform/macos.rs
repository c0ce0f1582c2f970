//! # macOS Queries
//!
//! Process attributes from `libproc` and `sysctl`.
//!
//! - `proc_listpids` / `proc_pidpath` through the `libproc` crate for the pid
//!   list and executable path
//! - `proc_pidinfo` for the working directory (`PROC_PIDVNODEPATHINFO`),
//!   process credentials and status (`PROC_PIDTBSDINFO`) and task accounting
//!   (`PROC_PIDTASKINFO`)
//! - `sysctl(KERN_PROCARGS2)` for the command line and environment
//!
//! ## KERN_PROCARGS2 layout
//!
//! ```text
//! argc (i32, native endian)
//! exec_path\0  \0\0...        <- padding up to the first argument
//! arg0\0 arg1\0 ... argN\0
//! env0\0 env1\0 ... \0
//! ```
//!
//! See: [sysctl(3) man page](https://developer.apple.com/library/archive/documentation/System/Conceptual/ManPages_iPhoneOS/man3/sysctl.3.html)

use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr;

use libproc::libproc::proc_pid;
use libproc::processes::{pids_by_type, ProcFilter};
use mach2::mach_time::{mach_timebase_info, mach_timebase_info_data_t};

use super::unix::{environ_record, text_list};
use crate::channel::ErrorChannel;
use crate::error::Result;
use crate::format::{build_list, build_named_list, Arg};
use crate::record::Record;
use crate::types::ProcessId;

/// `libproc` reports failures as text; keep the current `errno` when it is
/// set, otherwise record the text itself.
fn fail<T>(channel: &mut ErrorChannel, message: &str) -> Result<T>
{
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code != 0 => channel.set_from_errno(code),
        _ => channel.set_formatted(format!("System error: {message}")),
    }
    channel.throw_current()
}

/// All pids on the system, ascending, as `"I"` fields.
///
/// ## Errors
///
/// `System` if `proc_listpids` fails.
pub fn pids(channel: &mut ErrorChannel) -> Result<Record>
{
    let mut pids = match pids_by_type(ProcFilter::All) {
        Ok(pids) => pids,
        Err(err) => {
            channel.set_from_system_error(&err);
            return channel.throw_current();
        }
    };
    pids.sort_unstable();
    pids.dedup();

    build_list(&"I".repeat(pids.len()), pids.into_iter().map(Arg::from).collect())
}

/// Executable path of a process, as a one-field `"s"` record.
///
/// ## Errors
///
/// `System` / `NotFound` if `proc_pidpath` fails.
pub fn proc_exe(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let raw = pid.as_pid_t()?;
    match proc_pid::pidpath(raw) {
        Ok(path) => build_list("s", vec![Arg::from(path.as_str())]),
        Err(message) => fail(channel, &message),
    }
}

/// Run `proc_pidinfo` for one fixed-size flavor.
///
/// Only used with the plain C structs from `<sys/proc_info.h>`, for which the
/// all-zero bit pattern is valid.
fn pidinfo<T>(channel: &mut ErrorChannel, pid: ProcessId, flavor: libc::c_int, what: &str) -> Result<T>
{
    let raw = pid.as_pid_t()?;
    let mut info = MaybeUninit::<T>::zeroed();
    let size = libc::c_int::try_from(mem::size_of::<T>()).unwrap_or(libc::c_int::MAX);

    // SAFETY: `info` is valid for `size` bytes.
    let written = unsafe { libc::proc_pidinfo(raw, flavor, 0, info.as_mut_ptr().cast(), size) };
    if written != size {
        return fail(channel, &format!("proc_pidinfo({what}) failed for pid {pid}"));
    }
    // SAFETY: zero-initialized plain old data, fully written by the kernel.
    Ok(unsafe { info.assume_init() })
}

/// Text of a fixed-size, NUL-padded C string field.
fn c_chars(chars: &[libc::c_char]) -> String
{
    #[allow(clippy::cast_sign_loss)]
    let bytes: Vec<u8> = chars.iter().map(|&c| c as u8).take_while(|&b| b != 0).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Working directory of a process, as a one-field `"s"` record.
///
/// ## Errors
///
/// `System` if `proc_pidinfo(PROC_PIDVNODEPATHINFO)` fails.
pub fn proc_cwd(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let info: libc::proc_vnodepathinfo = pidinfo(channel, pid, libc::PROC_PIDVNODEPATHINFO, "PROC_PIDVNODEPATHINFO")?;
    let flat: Vec<libc::c_char> = info.pvi_cdir.vip_path.iter().flatten().copied().collect();
    let cwd = c_chars(&flat);
    build_list("s", vec![Arg::from(cwd.as_str())])
}

/// Field names of [`proc_kinfo_oneshot`], in record order.
pub const KINFO_FIELDS: [&str; 11] = [
    "ppid", "ruid", "euid", "suid", "rgid", "egid", "sgid", "ttynr", "ctime", "status", "name",
];

fn kinfo_record(info: &libc::proc_bsdinfo) -> Result<Record>
{
    // The short name is cut at MAXCOMLEN; prefer the long one when present.
    let name = match c_chars(&info.pbi_name) {
        long if !long.is_empty() => long,
        _ => c_chars(&info.pbi_comm),
    };
    #[allow(clippy::cast_precision_loss)]
    let ctime = info.pbi_start_tvsec as f64 + info.pbi_start_tvusec as f64 / 1_000_000.0;

    build_named_list(
        "IIIIIIIIdIs",
        &KINFO_FIELDS,
        vec![
            Arg::from(info.pbi_ppid),
            Arg::from(info.pbi_ruid),
            Arg::from(info.pbi_uid),
            Arg::from(info.pbi_svuid),
            Arg::from(info.pbi_rgid),
            Arg::from(info.pbi_gid),
            Arg::from(info.pbi_svgid),
            Arg::from(info.e_tdev),
            Arg::from(ctime),
            Arg::from(info.pbi_status),
            Arg::from(name.as_str()),
        ],
    )
}

/// Parent, credentials, terminal, start time, status and name of a process,
/// as one named record (see [`KINFO_FIELDS`]).
///
/// `ctime` is the start time in seconds since the Unix epoch.
///
/// ## Errors
///
/// `System` if `proc_pidinfo(PROC_PIDTBSDINFO)` fails, e.g. `ESRCH` for a
/// process that does not exist.
pub fn proc_kinfo_oneshot(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let info: libc::proc_bsdinfo = pidinfo(channel, pid, libc::PROC_PIDTBSDINFO, "PROC_PIDTBSDINFO")?;
    kinfo_record(&info)
}

/// Field names of [`proc_pidtaskinfo_oneshot`], in record order.
pub const TASKINFO_FIELDS: [&str; 9] = [
    "cpuutime", "cpustime", "rss", "vms", "pfaults", "pageins", "numthreads", "volctxsw", "syscalls",
];

/// Converts Mach absolute time units to nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timebase
{
    numer: u32,
    denom: u32,
}

impl Timebase
{
    fn query(channel: &mut ErrorChannel) -> Result<Self>
    {
        let mut info = mach_timebase_info_data_t { numer: 0, denom: 0 };
        // SAFETY: `info` is a valid, writable mach_timebase_info.
        let kr = unsafe { mach_timebase_info(&mut info) };
        if kr != 0 || info.denom == 0 {
            channel.set_formatted(format!("System error: mach_timebase_info failed ({kr})"));
            return channel.throw_current();
        }
        Ok(Self {
            numer: info.numer,
            denom: info.denom,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn seconds(self, ticks: u64) -> f64
    {
        ticks as f64 * f64::from(self.numer) / f64::from(self.denom) / 1e9
    }
}

fn taskinfo_record(info: &libc::proc_taskinfo, timebase: Timebase) -> Result<Record>
{
    build_named_list(
        "ddkkiiiii",
        &TASKINFO_FIELDS,
        vec![
            Arg::from(timebase.seconds(info.pti_total_user)),
            Arg::from(timebase.seconds(info.pti_total_system)),
            Arg::from(info.pti_resident_size),
            Arg::from(info.pti_virtual_size),
            Arg::from(info.pti_faults),
            Arg::from(info.pti_pageins),
            Arg::from(info.pti_threadnum),
            Arg::from(info.pti_csw),
            Arg::from(info.pti_syscalls_mach.saturating_add(info.pti_syscalls_unix)),
        ],
    )
}

/// CPU times, memory, faults, threads, context switches and syscalls of a
/// process, as one named record (see [`TASKINFO_FIELDS`]).
///
/// Times are in seconds; `rss` and `vms` in bytes.
///
/// ## Errors
///
/// `System` if `proc_pidinfo(PROC_PIDTASKINFO)` fails (commonly `EPERM` for
/// processes of other users) or the Mach timebase is unavailable.
pub fn proc_pidtaskinfo_oneshot(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let info: libc::proc_taskinfo = pidinfo(channel, pid, libc::PROC_PIDTASKINFO, "PROC_PIDTASKINFO")?;
    let timebase = Timebase::query(channel)?;
    taskinfo_record(&info, timebase)
}

fn sysctl_argmax(channel: &mut ErrorChannel) -> Result<usize>
{
    let mut mib = [libc::CTL_KERN, libc::KERN_ARGMAX];
    let mut argmax: libc::c_int = 0;
    let mut size = mem::size_of::<libc::c_int>();

    // SAFETY: `argmax` is valid for `size` bytes.
    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            2,
            ptr::addr_of_mut!(argmax).cast(),
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        channel.set_from_last_os_error();
        return channel.throw_current();
    }
    usize::try_from(argmax).or_else(|_| {
        channel.set_from_errno(libc::EINVAL);
        channel.throw_current()
    })
}

fn procargs(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Vec<u8>>
{
    let raw = pid.as_pid_t()?;
    let argmax = sysctl_argmax(channel)?;

    let mut mib = [libc::CTL_KERN, libc::KERN_PROCARGS2, raw];
    let mut buffer = vec![0u8; argmax];
    let mut size = buffer.len();

    // SAFETY: `buffer` is valid for `size` bytes.
    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            3,
            buffer.as_mut_ptr().cast(),
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        channel.set_from_last_os_error();
        return channel.throw_current();
    }
    buffer.truncate(size);
    Ok(buffer)
}

/// Split a `KERN_PROCARGS2` block into `(arguments, environment)`.
///
/// Returns `None` when the block is too short to hold `argc`.
pub(crate) fn parse_procargs(block: &[u8]) -> Option<(Vec<String>, Vec<String>)>
{
    let (argc, rest) = block.split_first_chunk::<4>()?;
    let argc = usize::try_from(i32::from_ne_bytes(*argc)).unwrap_or(0);

    // Skip the executable path and its NUL padding.
    let path_end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let mut cursor = &rest[path_end..];
    while let Some((&0, tail)) = cursor.split_first() {
        cursor = tail;
    }

    let mut strings = cursor.split(|&b| b == 0);
    let args: Vec<String> = strings
        .by_ref()
        .take(argc)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    let env: Vec<String> = strings
        .take_while(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    Some((args, env))
}

/// Command line of a process, one `"s"` field per argument.
///
/// ## Errors
///
/// `System` if `sysctl` fails (commonly `EINVAL` for zombies or processes of
/// other users).
pub fn proc_cmdline(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let block = procargs(channel, pid)?;
    match parse_procargs(&block) {
        Some((args, _)) => text_list(&args),
        None => text_list(&[]),
    }
}

/// Environment of a process, as a named record `NAME -> value`.
///
/// ## Errors
///
/// Same as [`proc_cmdline`].
pub fn proc_environ(channel: &mut ErrorChannel, pid: ProcessId) -> Result<Record>
{
    let block = procargs(channel, pid)?;
    match parse_procargs(&block) {
        Some((_, env)) => environ_record(&env),
        None => environ_record(&[]),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::record::Variant;

    fn block(argc: i32, body: &[u8]) -> Vec<u8>
    {
        let mut out = argc.to_ne_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_parse_procargs()
    {
        let raw = block(2, b"/bin/sleep\0\0\0\0sleep\x0010\0HOME=/Users/x\0TERM=xterm\0\0\0");
        let (args, env) = parse_procargs(&raw).unwrap();
        assert_eq!(args, vec!["sleep", "10"]);
        assert_eq!(env, vec!["HOME=/Users/x", "TERM=xterm"]);
    }

    #[test]
    fn test_parse_procargs_short_block()
    {
        assert!(parse_procargs(&[1, 0]).is_none());
    }

    #[test]
    fn test_proc_exe_self()
    {
        let mut channel = ErrorChannel::new();
        let record = proc_exe(&mut channel, ProcessId::current()).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(record.get(0).and_then(|v| v.as_str()), exe.to_str());
    }

    #[test]
    fn test_proc_cwd_self()
    {
        let mut channel = ErrorChannel::new();
        let record = proc_cwd(&mut channel, ProcessId::current()).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(record.get(0).and_then(|v| v.as_str()), cwd.to_str());
    }

    #[test]
    fn test_kinfo_record_prefers_long_name()
    {
        // SAFETY: proc_bsdinfo is plain old data.
        let mut info: libc::proc_bsdinfo = unsafe { mem::zeroed() };
        info.pbi_ppid = 1;
        info.pbi_uid = 501;
        info.pbi_ruid = 502;
        info.pbi_svuid = 503;
        info.pbi_start_tvsec = 10;
        info.pbi_start_tvusec = 500_000;
        for (dst, &src) in info.pbi_comm.iter_mut().zip(b"short") {
            *dst = src as libc::c_char;
        }

        let record = kinfo_record(&info).unwrap();
        assert_eq!(record.names(), Some(KINFO_FIELDS.to_vec()));
        assert_eq!(record.get_named("ppid"), Some(&Variant::UnsignedInteger(1)));
        assert_eq!(record.get_named("euid"), Some(&Variant::UnsignedInteger(501)));
        assert_eq!(record.get_named("ruid"), Some(&Variant::UnsignedInteger(502)));
        assert_eq!(record.get_named("suid"), Some(&Variant::UnsignedInteger(503)));
        assert_eq!(record.get_named("ctime"), Some(&Variant::Double(10.5)));
        assert_eq!(record.get_named("name"), Some(&Variant::text("short")));

        for (dst, &src) in info.pbi_name.iter_mut().zip(b"a-much-longer-name") {
            *dst = src as libc::c_char;
        }
        let record = kinfo_record(&info).unwrap();
        assert_eq!(record.get_named("name"), Some(&Variant::text("a-much-longer-name")));
    }

    #[test]
    fn test_taskinfo_record_converts_ticks()
    {
        // SAFETY: proc_taskinfo is plain old data.
        let mut info: libc::proc_taskinfo = unsafe { mem::zeroed() };
        info.pti_total_user = 3_000_000_000;
        info.pti_total_system = 125;
        info.pti_resident_size = 4096;
        info.pti_syscalls_mach = 2;
        info.pti_syscalls_unix = 3;
        info.pti_threadnum = 4;
        let timebase = Timebase { numer: 125, denom: 3 };

        let record = taskinfo_record(&info, timebase).unwrap();
        assert_eq!(record.names(), Some(TASKINFO_FIELDS.to_vec()));
        assert_eq!(record.get_named("cpuutime"), Some(&Variant::Double(125.0)));
        assert_eq!(record.get_named("rss"), Some(&Variant::Wide(4096.0)));
        assert_eq!(record.get_named("numthreads"), Some(&Variant::Integer(4)));
        assert_eq!(record.get_named("syscalls"), Some(&Variant::Integer(5)));
    }

    #[test]
    fn test_kinfo_self()
    {
        let mut channel = ErrorChannel::new();
        let record = proc_kinfo_oneshot(&mut channel, ProcessId::current()).unwrap();
        // SAFETY: getppid and geteuid cannot fail.
        let (ppid, euid) = unsafe { (libc::getppid(), libc::geteuid()) };
        assert_eq!(record.get_named("ppid"), Some(&Variant::UnsignedInteger(ppid.unsigned_abs())));
        assert_eq!(record.get_named("euid"), Some(&Variant::UnsignedInteger(euid)));
    }

    #[test]
    fn test_pidtaskinfo_self()
    {
        let mut channel = ErrorChannel::new();
        let record = proc_pidtaskinfo_oneshot(&mut channel, ProcessId::current()).unwrap();
        assert_eq!(record.len(), TASKINFO_FIELDS.len());
        assert!(matches!(record.get_named("rss"), Some(Variant::Wide(v)) if *v > 0.0));
        assert!(matches!(record.get_named("numthreads"), Some(Variant::Integer(n)) if *n >= 1));
    }

    #[test]
    fn test_kinfo_missing_process()
    {
        let mut channel = ErrorChannel::new();
        assert!(proc_kinfo_oneshot(&mut channel, ProcessId(0x7fff_ffff)).is_err());
        assert!(channel.peek().is_some());
    }
}

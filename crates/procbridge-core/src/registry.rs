//! # Call Registry
//!
//! Static table mapping stable call names to bridge functions.
//!
//! A host resolves a call by name, passes its arguments as strings and gets a
//! [`Record`] back:
//!
//! ```rust
//! use procbridge_core::registry;
//!
//! let flags = registry::call("os_type", &[])?;
//! assert_eq!(flags.len(), 10);
//!
//! assert!(registry::call("no_such_call", &[]).is_err());
//! # Ok::<(), procbridge_core::error::BridgeError>(())
//! ```
//!
//! Which calls exist depends on the target: `readlink`, `proc_*` and the
//! `linux_*` / `*_oneshot` calls are only registered where the platform supports them.

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::capability;
use crate::channel::{self, ErrorChannel};
use crate::error::{BridgeError, Result};
use crate::record::Record;
use crate::types::ProcessId;

/// Signature shared by every registered call.
pub type CallFn = fn(&mut ErrorChannel, &[&str]) -> Result<Record>;

/// One entry of the call table
#[derive(Debug, Clone, Copy)]
pub struct CallMethod
{
    /// Stable name the host calls by
    pub name: &'static str,
    /// Number of arguments the call takes
    pub arity: usize,
    /// Implementation
    pub func: CallFn,
}

impl CallMethod
{
    const fn new(name: &'static str, arity: usize, func: CallFn) -> Self
    {
        Self { name, arity, func }
    }
}

#[cfg_attr(not(unix), allow(dead_code))]
fn pid_arg(args: &[&str]) -> Result<ProcessId>
{
    args.first()
        .ok_or_else(|| BridgeError::InvalidArgument("missing process id".to_owned()))?
        .parse()
}

fn os_type_call(_: &mut ErrorChannel, _: &[&str]) -> Result<Record>
{
    Ok(capability::os_type())
}

#[cfg(unix)]
mod unix_calls
{
    use std::path::Path;

    use super::{pid_arg, CallMethod, ErrorChannel, Record, Result};
    use crate::error::BridgeError;
    use crate::platform::unix;

    fn pid_exists(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        unix::pid_exists(channel, pid_arg(args)?)
    }

    fn readlink(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        let path = args
            .first()
            .ok_or_else(|| BridgeError::InvalidArgument("missing path".to_owned()))?;
        unix::readlink(channel, Path::new(path))
    }

    pub(super) const METHODS: &[CallMethod] = &[
        CallMethod::new("pid_exists", 1, pid_exists),
        CallMethod::new("readlink", 1, readlink),
    ];
}

#[cfg(target_os = "linux")]
mod native_calls
{
    use super::{pid_arg, CallMethod, ErrorChannel, Record, Result};
    use crate::platform::linux;

    fn pids(channel: &mut ErrorChannel, _: &[&str]) -> Result<Record>
    {
        linux::pids(channel)
    }

    fn proc_exe(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        linux::proc_exe(channel, pid_arg(args)?)
    }

    fn proc_cmdline(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        linux::proc_cmdline(channel, pid_arg(args)?)
    }

    fn proc_environ(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        linux::proc_environ(channel, pid_arg(args)?)
    }

    fn proc_cwd(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        linux::proc_cwd(channel, pid_arg(args)?)
    }

    fn clk_tck(channel: &mut ErrorChannel, _: &[&str]) -> Result<Record>
    {
        linux::linux_clk_tck(channel)
    }

    fn pagesize(channel: &mut ErrorChannel, _: &[&str]) -> Result<Record>
    {
        linux::linux_pagesize(channel)
    }

    pub(super) const METHODS: &[CallMethod] = &[
        CallMethod::new("pids", 0, pids),
        CallMethod::new("proc_exe", 1, proc_exe),
        CallMethod::new("proc_cmdline", 1, proc_cmdline),
        CallMethod::new("proc_environ", 1, proc_environ),
        CallMethod::new("proc_cwd", 1, proc_cwd),
        CallMethod::new("linux_clk_tck", 0, clk_tck),
        CallMethod::new("linux_pagesize", 0, pagesize),
    ];
}

#[cfg(target_os = "macos")]
mod native_calls
{
    use super::{pid_arg, CallMethod, ErrorChannel, Record, Result};
    use crate::platform::macos;

    fn pids(channel: &mut ErrorChannel, _: &[&str]) -> Result<Record>
    {
        macos::pids(channel)
    }

    fn proc_exe(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_exe(channel, pid_arg(args)?)
    }

    fn proc_cmdline(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_cmdline(channel, pid_arg(args)?)
    }

    fn proc_environ(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_environ(channel, pid_arg(args)?)
    }

    fn proc_cwd(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_cwd(channel, pid_arg(args)?)
    }

    fn proc_kinfo_oneshot(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_kinfo_oneshot(channel, pid_arg(args)?)
    }

    fn proc_pidtaskinfo_oneshot(channel: &mut ErrorChannel, args: &[&str]) -> Result<Record>
    {
        macos::proc_pidtaskinfo_oneshot(channel, pid_arg(args)?)
    }

    pub(super) const METHODS: &[CallMethod] = &[
        CallMethod::new("pids", 0, pids),
        CallMethod::new("proc_exe", 1, proc_exe),
        CallMethod::new("proc_cmdline", 1, proc_cmdline),
        CallMethod::new("proc_environ", 1, proc_environ),
        CallMethod::new("proc_cwd", 1, proc_cwd),
        CallMethod::new("proc_kinfo_oneshot", 1, proc_kinfo_oneshot),
        CallMethod::new("proc_pidtaskinfo_oneshot", 1, proc_pidtaskinfo_oneshot),
    ];
}

static CALL_METHODS: Lazy<Vec<CallMethod>> = Lazy::new(|| {
    let mut methods = vec![CallMethod::new("os_type", 0, os_type_call)];
    #[cfg(unix)]
    methods.extend_from_slice(unix_calls::METHODS);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    methods.extend_from_slice(native_calls::METHODS);
    methods
});

/// Every call registered for this target.
pub fn methods() -> &'static [CallMethod]
{
    &CALL_METHODS
}

/// Look up a call by name.
#[must_use]
pub fn find(name: &str) -> Option<&'static CallMethod>
{
    CALL_METHODS.iter().find(|m| m.name == name)
}

/// Invoke a registered call.
///
/// Each invocation gets a fresh [`ErrorChannel`]. Every failure, including an
/// unknown name or a wrong argument count, is copied to the process-wide slot
/// read by [`channel::last_error`].
///
/// ## Errors
///
/// - `UnknownCall`: no call named `name`
/// - `CallArity`: wrong number of arguments
/// - whatever the call itself reports
pub fn call(name: &str, args: &[&str]) -> Result<Record>
{
    let mut channel = ErrorChannel::new();
    let result = dispatch(&mut channel, name, args);

    if let Err(err) = &result {
        if channel.peek().is_none() {
            channel.set_formatted(err.to_string());
        }
        channel::record_last(&channel);
        debug!(name, error = %err, "bridge call failed");
    }
    result
}

fn dispatch(channel: &mut ErrorChannel, name: &str, args: &[&str]) -> Result<Record>
{
    let method = find(name).ok_or_else(|| BridgeError::UnknownCall(name.to_owned()))?;
    if args.len() != method.arity {
        return Err(BridgeError::CallArity {
            name: method.name,
            expected: method.arity,
            found: args.len(),
        });
    }

    trace!(name, ?args, "dispatching bridge call");
    (method.func)(channel, args)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_names_are_unique()
    {
        let mut names: Vec<_> = methods().iter().map(|m| m.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_unknown_call()
    {
        assert_eq!(call("nope", &[]).unwrap_err(), BridgeError::UnknownCall("nope".to_owned()));
    }

    #[test]
    fn test_os_type_takes_no_arguments()
    {
        let err = call("os_type", &["1"]).unwrap_err();
        assert_eq!(
            err,
            BridgeError::CallArity {
                name: "os_type",
                expected: 0,
                found: 1,
            }
        );
    }
}

//! Process identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Process identifier (PID)
///
/// A PID is a unique number assigned to each running process by the operating
/// system. On Unix-like systems (macOS, Linux), PIDs are positive 32-bit
/// integers; the kernel's `pid_t` is signed, so values above `i32::MAX` are
/// rejected when converted with [`ProcessId::as_pid_t`].
///
/// ## Example
///
/// ```rust
/// use procbridge_core::types::ProcessId;
///
/// let pid: ProcessId = "4242".parse()?;
/// assert_eq!(pid, ProcessId::from(4242));
/// assert_eq!(pid.to_string(), "4242");
/// # Ok::<(), procbridge_core::error::BridgeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl ProcessId
{
    /// The calling process.
    #[must_use]
    pub fn current() -> Self
    {
        ProcessId(std::process::id())
    }

    /// Convert to the kernel's signed `pid_t`.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if the value does not fit in a `pid_t`.
    pub fn as_pid_t(self) -> Result<libc::pid_t, BridgeError>
    {
        libc::pid_t::try_from(self.0).map_err(|_| BridgeError::InvalidArgument(format!("pid {} is out of range", self.0)))
    }
}

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl FromStr for ProcessId
{
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        s.trim()
            .parse::<u32>()
            .map(ProcessId)
            .map_err(|_| BridgeError::InvalidArgument(format!("not a process id: {s:?}")))
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

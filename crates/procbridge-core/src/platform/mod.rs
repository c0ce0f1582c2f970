//! # Platform-Specific Implementations
//!
//! Per-OS process attribute queries. Every query follows the same contract:
//!
//! 1. Invoke one OS primitive
//! 2. On failure, record it in the [`ErrorChannel`](crate::channel::ErrorChannel)
//!    and throw it
//! 3. On success, shape the raw value through the
//!    [format encoder](crate::format) so the caller always gets a
//!    [`Record`](crate::record::Record)
//!
//! - **unix**: `kill(pid, 0)` and `readlink(2)`, shared by all Unix targets
//! - **linux**: `/proc` and `sysconf`
//!   - See: [proc(5) man page](https://man7.org/linux/man-pages/man5/proc.5.html)
//! - **macos**: `libproc` and `sysctl(KERN_PROCARGS2)`

#[cfg(unix)]
pub mod unix;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

//! # Error Channel
//!
//! The last-error slot every bridge call reports failures through.
//!
//! A query that detects an OS failure records it and then throws it:
//!
//! ```rust
//! use procbridge_core::channel::ErrorChannel;
//! use procbridge_core::error::{BridgeError, Result};
//!
//! fn query(channel: &mut ErrorChannel) -> Result<()>
//! {
//!     let err = std::io::Error::from_raw_os_error(libc::ENOENT);
//!     channel.set_from_system_error(&err);
//!     channel.throw_current()
//! }
//!
//! let mut channel = ErrorChannel::new();
//! assert!(matches!(query(&mut channel), Err(BridgeError::NotFound(_))));
//! assert!(channel.peek().unwrap().starts_with("System error: "));
//! ```
//!
//! Each call gets its own channel. The dispatch registry copies the last
//! failure into a process-wide slot (see [`last_error`]) so a host can look at
//! it afterwards; queries never read that slot.

use std::io;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{BridgeError, Result};

/// Classification of the message held by an [`ErrorChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind
{
    /// Derived from an OS error code
    System,
    /// Derived from `ENOENT`, or an empty result treated as not found
    NotFound,
    /// A kernel string outgrew its size cap
    TooLarge,
    /// Set verbatim with [`ErrorChannel::set_formatted`]
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Outstanding
{
    kind: FailureKind,
    message: String,
}

/// Single-slot holder for the current outstanding error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorChannel
{
    slot: Option<Outstanding>,
}

impl ErrorChannel
{
    /// Create an empty channel.
    #[must_use]
    pub const fn new() -> Self
    {
        Self { slot: None }
    }

    /// Empty the slot.
    pub fn clear(&mut self)
    {
        self.slot = None;
    }

    /// Overwrite the slot with a custom message.
    pub fn set_formatted(&mut self, message: impl Into<String>)
    {
        self.set(FailureKind::Custom, message.into());
    }

    /// Overwrite the slot with the text of an OS error.
    ///
    /// The message reads `System error: <strerror text>`. `ENOENT` is
    /// recorded as [`FailureKind::NotFound`].
    pub fn set_from_system_error(&mut self, err: &io::Error)
    {
        match err.raw_os_error() {
            Some(code) => self.set_from_errno(code),
            None => {
                let kind = if err.kind() == io::ErrorKind::NotFound {
                    FailureKind::NotFound
                } else {
                    FailureKind::System
                };
                self.set(kind, format!("System error: {err}"));
            }
        }
    }

    /// Overwrite the slot with the text of a raw `errno` value.
    pub fn set_from_errno(&mut self, code: i32)
    {
        let kind = if code == libc::ENOENT {
            FailureKind::NotFound
        } else {
            FailureKind::System
        };
        self.set(kind, format!("System error: {}", os_error_text(code)));
    }

    /// Overwrite the slot with the calling thread's current `errno`.
    pub fn set_from_last_os_error(&mut self)
    {
        self.set_from_system_error(&io::Error::last_os_error());
    }

    /// Overwrite the slot with a "result too large" message.
    pub fn set_too_large(&mut self, message: impl Into<String>)
    {
        self.set(FailureKind::TooLarge, message.into());
    }

    /// Current message, without modifying state.
    #[must_use]
    pub fn peek(&self) -> Option<&str>
    {
        self.slot.as_ref().map(|o| o.message.as_str())
    }

    /// Kind of the current message, if any.
    #[must_use]
    pub fn kind(&self) -> Option<FailureKind>
    {
        self.slot.as_ref().map(|o| o.kind)
    }

    /// Convert the current message into a [`BridgeError`].
    ///
    /// An empty slot (or an empty message) becomes [`BridgeError::Unknown`].
    #[must_use]
    pub fn current(&self) -> BridgeError
    {
        match &self.slot {
            Some(o) if !o.message.is_empty() => {
                let message = o.message.clone();
                match o.kind {
                    FailureKind::System => BridgeError::System(message),
                    FailureKind::NotFound => BridgeError::NotFound(message),
                    FailureKind::TooLarge => BridgeError::TooLarge(message),
                    FailureKind::Custom => BridgeError::Failed(message),
                }
            }
            _ => BridgeError::Unknown,
        }
    }

    /// Raise the current message as a failure.
    ///
    /// Never returns `Ok`.
    ///
    /// ## Errors
    ///
    /// Always; see [`ErrorChannel::current`].
    pub fn throw_current<T>(&self) -> Result<T>
    {
        Err(self.current())
    }

    fn set(&mut self, kind: FailureKind, message: String)
    {
        debug!(?kind, %message, "error channel set");
        self.slot = Some(Outstanding { kind, message });
    }
}

/// Human-readable text for an OS error code.
#[cfg(unix)]
#[must_use]
pub fn os_error_text(code: i32) -> String
{
    use std::ffi::CStr;

    let mut buf = [0u8; 256];
    // SAFETY: the buffer is valid for `buf.len()` bytes and strerror_r
    // NUL-terminates on success.
    let rc = unsafe { libc::strerror_r(code, buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return format!("Unknown error {code}");
    }
    CStr::from_bytes_until_nul(&buf)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| format!("Unknown error {code}"))
}

/// Human-readable text for an OS error code.
#[cfg(not(unix))]
#[must_use]
pub fn os_error_text(code: i32) -> String
{
    io::Error::from_raw_os_error(code).to_string()
}

static LAST_ERROR: Lazy<Mutex<ErrorChannel>> = Lazy::new(|| Mutex::new(ErrorChannel::new()));

/// Copy a call's channel into the process-wide slot.
pub fn record_last(channel: &ErrorChannel)
{
    if let Ok(mut last) = LAST_ERROR.lock() {
        last.clone_from(channel);
    }
}

/// Message of the most recent failure recorded with [`record_last`].
#[must_use]
pub fn last_error() -> Option<String>
{
    LAST_ERROR.lock().ok().and_then(|c| c.peek().map(str::to_owned))
}

/// Empty the process-wide slot.
pub fn clear_last()
{
    if let Ok(mut last) = LAST_ERROR.lock() {
        last.clear();
    }
}

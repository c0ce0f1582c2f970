//! # Kernel String Query
//!
//! Retry-with-growing-buffer reads for OS calls that return text of unknown
//! length and cannot report the length they need.
//!
//! `readlink(2)` is the typical case: files under `/proc` report a size of
//! zero, so `lstat()` cannot be used to size the buffer. Instead the call is
//! repeated with a larger buffer until the result no longer fills it.
//!
//! ## Protocol
//!
//! 1. Start with [`INITIAL_CAPACITY`] bytes.
//! 2. Let the primitive write at most `capacity - 1` bytes.
//! 3. A failure is reported through the [`ErrorChannel`]; a zero-length result
//!    is reported as `ENOENT`; a result shorter than the window is done;
//!    anything else grows the buffer by [`GROWTH_STEP`] and retries.
//! 4. The payload is cut at its first NUL byte.
//!
//! Growth stops at a caller-supplied cap, past which the query fails with
//! [`BridgeError::TooLarge`](crate::error::BridgeError::TooLarge).

use std::io;

use tracing::{debug, warn};

use crate::channel::ErrorChannel;
use crate::error::Result;

/// Buffer size of the first attempt
pub const INITIAL_CAPACITY: usize = 1024;
/// Bytes added to the buffer after each attempt that filled it
pub const GROWTH_STEP: usize = 1024;
/// Default cap on the buffer size
pub const DEFAULT_MAX_CAPACITY: usize = 1024 * 1024;

/// Run `primitive` against a growing buffer and return the raw payload.
///
/// `primitive` receives the writable window and returns how many bytes it
/// wrote, or the OS error it hit. The returned bytes stop before the first
/// NUL, if any.
///
/// ## Errors
///
/// - `System` / `NotFound`: the primitive failed
/// - `NotFound`: the primitive wrote nothing
/// - `TooLarge`: the buffer would have to grow beyond `max_capacity`
///
/// In every case `channel` holds the message of the returned error.
pub fn query_kernel_bytes<F>(channel: &mut ErrorChannel, max_capacity: usize, mut primitive: F) -> Result<Vec<u8>>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let mut buffer = vec![0u8; INITIAL_CAPACITY];

    let written = loop {
        let window = buffer.len() - 1;
        match primitive(&mut buffer[..window]) {
            Err(err) => {
                channel.set_from_system_error(&err);
                return channel.throw_current();
            }
            Ok(0) => {
                channel.set_from_errno(libc::ENOENT);
                return channel.throw_current();
            }
            Ok(n) if n < window => break n,
            Ok(n) => {
                let next = buffer.len() + GROWTH_STEP;
                if next > max_capacity {
                    warn!(capacity = buffer.len(), max_capacity, "kernel string exceeds size cap");
                    channel.set_too_large(format!(
                        "Result too large: kernel string needs more than {max_capacity} bytes"
                    ));
                    return channel.throw_current();
                }
                debug!(written = n, capacity = buffer.len(), next, "kernel string buffer full, growing");
                buffer.resize(next, 0);
            }
        }
    };

    buffer.truncate(written);
    if let Some(nul) = buffer.iter().position(|&b| b == 0) {
        buffer.truncate(nul);
    }
    Ok(buffer)
}

/// Like [`query_kernel_bytes`], decoding the payload as (lossy) UTF-8 text.
///
/// ## Errors
///
/// See [`query_kernel_bytes`].
pub fn query_kernel_string<F>(channel: &mut ErrorChannel, max_capacity: usize, primitive: F) -> Result<String>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let bytes = query_kernel_bytes(channel, max_capacity, primitive)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_short_result_first_attempt()
    {
        let mut channel = ErrorChannel::new();
        let mut windows = Vec::new();
        let text = query_kernel_string(&mut channel, DEFAULT_MAX_CAPACITY, |buf| {
            windows.push(buf.len());
            buf[..5].copy_from_slice(b"/bin/");
            Ok(5)
        })
        .unwrap();

        assert_eq!(text, "/bin/");
        assert_eq!(windows, vec![INITIAL_CAPACITY - 1]);
        assert_eq!(channel.peek(), None);
    }

    #[test]
    fn test_nul_truncates_payload()
    {
        let mut channel = ErrorChannel::new();
        let bytes = query_kernel_bytes(&mut channel, DEFAULT_MAX_CAPACITY, |buf| {
            let raw = b"/usr/bin/app\0 (deleted)";
            buf[..raw.len()].copy_from_slice(raw);
            Ok(raw.len())
        })
        .unwrap();
        assert_eq!(bytes, b"/usr/bin/app");
    }

    #[test]
    fn test_cap_yields_too_large()
    {
        let mut channel = ErrorChannel::new();
        let mut attempts = 0;
        let err = query_kernel_bytes(&mut channel, 3 * 1024, |buf| {
            attempts += 1;
            Ok(buf.len())
        })
        .unwrap_err();

        assert!(matches!(err, BridgeError::TooLarge(_)));
        assert_eq!(attempts, 3);
        assert!(channel.peek().unwrap().starts_with("Result too large"));
    }
}

//! Tests for the growing-buffer kernel string query

use std::io;

use procbridge_core::channel::{os_error_text, ErrorChannel};
use procbridge_core::error::BridgeError;
use procbridge_core::kernel_string::{query_kernel_bytes, query_kernel_string, DEFAULT_MAX_CAPACITY, GROWTH_STEP, INITIAL_CAPACITY};

/// A primitive that pretends the kernel holds `payload`, recording each window it is offered.
fn fake_kernel(payload: Vec<u8>, windows: &mut Vec<usize>) -> impl FnMut(&mut [u8]) -> io::Result<usize> + '_
{
    move |buf| {
        windows.push(buf.len());
        let n = payload.len().min(buf.len());
        buf[..n].copy_from_slice(&payload[..n]);
        Ok(n)
    }
}

#[test]
fn test_short_payload_needs_one_attempt()
{
    let mut windows = Vec::new();
    let mut channel = ErrorChannel::new();
    let payload = vec![b'a'; 1000];

    let bytes = query_kernel_bytes(&mut channel, DEFAULT_MAX_CAPACITY, fake_kernel(payload.clone(), &mut windows)).unwrap();

    assert_eq!(bytes, payload);
    assert_eq!(windows, vec![INITIAL_CAPACITY - 1]);
}

#[test]
fn test_payload_filling_window_retries_larger()
{
    let mut windows = Vec::new();
    let mut channel = ErrorChannel::new();
    let payload = vec![b'b'; INITIAL_CAPACITY - 1];

    let bytes = query_kernel_bytes(&mut channel, DEFAULT_MAX_CAPACITY, fake_kernel(payload.clone(), &mut windows)).unwrap();

    assert_eq!(bytes, payload);
    assert_eq!(windows, vec![INITIAL_CAPACITY - 1, INITIAL_CAPACITY + GROWTH_STEP - 1]);
}

#[test]
fn test_long_payload_grows_until_it_fits()
{
    let mut windows = Vec::new();
    let mut channel = ErrorChannel::new();
    let payload = vec![b'c'; 5000];

    let text = query_kernel_string(&mut channel, DEFAULT_MAX_CAPACITY, fake_kernel(payload, &mut windows)).unwrap();

    assert_eq!(text.len(), 5000);
    assert_eq!(windows, vec![1023, 2047, 3071, 4095, 5119]);
}

#[test]
fn test_failing_primitive_reports_os_text()
{
    let mut channel = ErrorChannel::new();
    let err = query_kernel_string(&mut channel, DEFAULT_MAX_CAPACITY, |_| {
        Err(io::Error::from_raw_os_error(libc::EACCES))
    })
    .unwrap_err();

    let expected = format!("System error: {}", os_error_text(libc::EACCES));
    assert_eq!(err, BridgeError::System(expected.clone()));
    assert_eq!(channel.peek(), Some(expected.as_str()));
}

#[test]
fn test_missing_target_is_not_found()
{
    let mut channel = ErrorChannel::new();
    let err = query_kernel_string(&mut channel, DEFAULT_MAX_CAPACITY, |_| {
        Err(io::Error::from_raw_os_error(libc::ENOENT))
    })
    .unwrap_err();

    assert!(matches!(err, BridgeError::NotFound(_)));
}

#[test]
fn test_empty_result_is_not_found()
{
    let mut channel = ErrorChannel::new();
    let err = query_kernel_string(&mut channel, DEFAULT_MAX_CAPACITY, |_| Ok(0)).unwrap_err();

    assert_eq!(err, BridgeError::NotFound(format!("System error: {}", os_error_text(libc::ENOENT))));
}

#[test]
fn test_cap_stops_growth()
{
    let mut attempts = 0;
    let mut channel = ErrorChannel::new();
    let err = query_kernel_string(&mut channel, 4096, |buf| {
        attempts += 1;
        buf.fill(b'x');
        Ok(buf.len())
    })
    .unwrap_err();

    assert!(matches!(err, BridgeError::TooLarge(_)));
    assert!(err.to_string().contains("4096"));
    assert_eq!(attempts, 4);
}

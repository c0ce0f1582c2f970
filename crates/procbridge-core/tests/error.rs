//! Tests for error reporting

use procbridge_core::channel::{self, os_error_text, ErrorChannel, FailureKind};
use procbridge_core::error::BridgeError;

#[test]
fn test_unknown_code_names_the_key()
{
    let message = BridgeError::UnknownCode('x').to_string();
    assert_eq!(message, "Unknown conversion key: `x`");
}

#[test]
fn test_unimplemented_message()
{
    assert_eq!(BridgeError::Unimplemented('D').to_string(), "'D' is not implemented yet");
}

#[test]
fn test_system_error_shows_message_verbatim()
{
    let error = BridgeError::System("System error: Permission denied".to_owned());
    assert_eq!(error.to_string(), "System error: Permission denied");
}

#[test]
fn test_unknown_error_message()
{
    assert_eq!(BridgeError::Unknown.to_string(), "Unknown error");
}

#[test]
fn test_programmer_errors()
{
    assert!(BridgeError::UnknownCode('?').is_programmer_error());
    assert!(BridgeError::UnknownCall("nope".to_owned()).is_programmer_error());
    assert!(!BridgeError::NotFound("gone".to_owned()).is_programmer_error());
    assert!(!BridgeError::Unknown.is_programmer_error());
}

#[test]
fn test_channel_errno_message()
{
    let mut channel = ErrorChannel::new();
    channel.set_from_errno(libc::EACCES);

    let expected = format!("System error: {}", os_error_text(libc::EACCES));
    assert_eq!(channel.peek(), Some(expected.as_str()));
    assert_eq!(channel.kind(), Some(FailureKind::System));
    assert_eq!(channel.throw_current::<()>(), Err(BridgeError::System(expected)));
}

#[test]
fn test_channel_enoent_is_not_found()
{
    let mut channel = ErrorChannel::new();
    channel.set_from_errno(libc::ENOENT);
    assert!(matches!(channel.current(), BridgeError::NotFound(_)));
}

#[test]
fn test_channel_last_write_wins()
{
    let mut channel = ErrorChannel::new();
    channel.set_formatted("first");
    channel.set_formatted("second");
    assert_eq!(channel.current(), BridgeError::Failed("second".to_owned()));
}

#[test]
fn test_channel_empty_message_is_unknown()
{
    let mut channel = ErrorChannel::new();
    channel.set_formatted("");
    assert_eq!(channel.current(), BridgeError::Unknown);

    channel.clear();
    assert_eq!(channel.throw_current::<()>(), Err(BridgeError::Unknown));
}

#[test]
fn test_process_wide_slot()
{
    let mut failed = ErrorChannel::new();
    failed.set_formatted("boom");
    channel::record_last(&failed);
    assert_eq!(channel::last_error().as_deref(), Some("boom"));

    channel::clear_last();
    assert_eq!(channel::last_error(), None);
}

//! Tests for the format encoder

use procbridge_core::error::BridgeError;
use procbridge_core::format::{build_list, build_named_list, Arg, FormatSpec};
use procbridge_core::record::{RecordBuilder, Variant};

#[test]
fn test_unnamed_text_and_integer()
{
    let record = build_list("si", vec![Arg::from("hello"), Arg::from(42)]).unwrap();

    assert_eq!(record.len(), 2);
    assert_eq!(record.names(), None);
    assert_eq!(record.get(0), Some(&Variant::text("hello")));
    assert_eq!(record.get(1), Some(&Variant::Integer(42)));
}

#[test]
fn test_named_fields()
{
    let record = build_named_list("si", &["label", "count"], vec![Arg::from("bob"), Arg::from(5)]).unwrap();

    assert_eq!(record.names(), Some(vec!["label", "count"]));
    assert_eq!(record.get_named("label"), Some(&Variant::text("bob")));
    assert_eq!(record.get_named("count"), Some(&Variant::Integer(5)));
    assert_eq!(record.to_string(), r#"{label: "bob", count: 5}"#);
}

#[test]
fn test_absent_string_is_null()
{
    let record = build_list("s", vec![Arg::Str(None)]).unwrap();
    assert_eq!(record.len(), 1);
    assert!(record.get(0).is_some_and(Variant::is_null));
}

#[test]
fn test_unknown_key_reports_character()
{
    let err = build_list("x", vec![Arg::from(1)]).unwrap_err();
    assert_eq!(err, BridgeError::UnknownCode('x'));
    assert!(err.to_string().contains('x'));
}

#[test]
fn test_reserved_keys_always_fail()
{
    for key in ["u", "D"] {
        let err = FormatSpec::parse(key).unwrap_err();
        assert!(matches!(err, BridgeError::Unimplemented(_)), "{key}: {err}");
    }
}

#[test]
fn test_non_alphabetic_key_is_unknown()
{
    assert_eq!(FormatSpec::parse("s1").unwrap_err(), BridgeError::UnknownCode('1'));
    assert_eq!(FormatSpec::parse("(s)").unwrap_err(), BridgeError::UnknownCode('('));
}

#[test]
fn test_spec_is_checked_before_arguments()
{
    // The bad key comes last, but no field is produced for the good one
    let err = build_list("sx", vec![Arg::from("a"), Arg::from(1)]).unwrap_err();
    assert_eq!(err, BridgeError::UnknownCode('x'));
}

#[test]
fn test_field_order_matches_spec()
{
    let record = build_list(
        "iIdC",
        vec![Arg::from(-3), Arg::from(7u32), Arg::from(2.5), Arg::from(b'z')],
    )
    .unwrap();

    let values: Vec<_> = record.values().cloned().collect();
    assert_eq!(
        values,
        vec![
            Variant::Integer(-3),
            Variant::UnsignedInteger(7),
            Variant::Double(2.5),
            Variant::Char('z'),
        ]
    );
}

#[test]
fn test_wide_integers()
{
    let record = build_list(
        "lkn",
        vec![Arg::from(-5_000_000_000i64), Arg::from(5_000_000_000u64), Arg::from(4096usize)],
    )
    .unwrap();

    assert_eq!(record.get(0), Some(&Variant::Wide(-5_000_000_000.0)));
    assert_eq!(record.get(1), Some(&Variant::Wide(5_000_000_000.0)));
    assert_eq!(record.get(2), Some(&Variant::Wide(4096.0)));
}

#[test]
fn test_bytes_and_byte()
{
    let payload: &[u8] = &[0xde, 0xad];
    let record = build_list("yc", vec![Arg::from(payload), Arg::from(7u8)]).unwrap();

    assert_eq!(record.get(0), Some(&Variant::Bytes(vec![0xde, 0xad])));
    assert_eq!(record.get(1), Some(&Variant::Byte(7)));
}

#[test]
fn test_passthrough_record_is_nested()
{
    let inner = RecordBuilder::new().value(Variant::Integer(1)).build();
    let record = build_list("O", vec![Arg::from(inner.clone())]).unwrap();
    assert_eq!(record.get(0), Some(&Variant::Record(inner)));
}

#[test]
fn test_empty_spec_gives_empty_record()
{
    let record = build_list("", Vec::new()).unwrap();
    assert!(record.is_empty());
}

#[test]
fn test_argument_count_mismatch()
{
    let err = build_list("ss", vec![Arg::from("only one")]).unwrap_err();
    assert_eq!(
        err,
        BridgeError::ArityMismatch {
            spec: "ss".to_owned(),
            what: "arguments",
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn test_name_count_mismatch()
{
    let err = build_named_list("i", &["a", "b"], vec![Arg::from(1)]).unwrap_err();
    assert!(matches!(err, BridgeError::ArityMismatch { what: "names", .. }));
}

#[test]
fn test_argument_kind_mismatch()
{
    let err = build_list("si", vec![Arg::from("ok"), Arg::from("not an int")]).unwrap_err();
    assert_eq!(
        err,
        BridgeError::ArgumentMismatch {
            index: 1,
            code: 'i',
            found: "string",
        }
    );
}

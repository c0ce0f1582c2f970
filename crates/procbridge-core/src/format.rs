//! # Format Encoder
//!
//! Turns a compact format spec plus a list of typed arguments into a
//! [`Record`].
//!
//! Each character of the spec is one conversion key and produces one field:
//!
//! | key | argument | field |
//! |-----|----------|-------|
//! | `s` `z` `U` | [`Arg::Str`] | text, or null when absent |
//! | `y` | [`Arg::Bytes`] | raw bytes |
//! | `i` `b` `h` `B` `H` | [`Arg::Int`] | integer |
//! | `I` | [`Arg::UInt`] | unsigned integer |
//! | `l` `L` | [`Arg::Long`] | wide integer |
//! | `k` `K` | [`Arg::ULong`] | wide integer |
//! | `n` | [`Arg::Size`] | wide integer |
//! | `c` | [`Arg::Char`] | byte |
//! | `C` | [`Arg::Char`] | one-character text |
//! | `d` `f` | [`Arg::Double`] | double |
//! | `S` `N` `O` | [`Arg::Record`] | nested record, verbatim |
//!
//! `u` and `D` are reserved and always fail. Any other character fails with
//! `Unknown conversion key`.
//!
//! ## Example
//!
//! ```rust
//! use procbridge_core::format::{build_list, build_named_list, Arg};
//! use procbridge_core::record::Variant;
//!
//! let record = build_list("si", vec![Arg::from("hello"), Arg::from(42)])?;
//! assert_eq!(record.to_string(), r#"["hello", 42]"#);
//!
//! let record = build_named_list("si", &["label", "count"], vec![Arg::from("bob"), Arg::from(5)])?;
//! assert_eq!(record.get_named("count"), Some(&Variant::Integer(5)));
//! # Ok::<(), procbridge_core::error::BridgeError>(())
//! ```

use tracing::trace;

use crate::error::{BridgeError, Result};
use crate::record::{Record, RecordBuilder, Variant};

/// What a conversion key decodes its argument as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code
{
    /// `s`, `z`, `U`
    Text,
    /// `y`
    Bytes,
    /// `i`, `b`, `h`, `B`, `H`
    Integer,
    /// `I`
    UnsignedInteger,
    /// `l`
    Long,
    /// `k`
    UnsignedLong,
    /// `L`
    LongLong,
    /// `K`
    UnsignedLongLong,
    /// `n`
    Size,
    /// `c`
    Byte,
    /// `C`
    Char,
    /// `d`, `f`
    Double,
    /// `S`, `N`, `O`
    Passthrough,
}

impl TryFrom<char> for Code
{
    type Error = BridgeError;

    fn try_from(key: char) -> Result<Self>
    {
        let code = match key {
            's' | 'z' | 'U' => Code::Text,
            'y' => Code::Bytes,
            'i' | 'b' | 'h' | 'B' | 'H' => Code::Integer,
            'I' => Code::UnsignedInteger,
            'l' => Code::Long,
            'k' => Code::UnsignedLong,
            'L' => Code::LongLong,
            'K' => Code::UnsignedLongLong,
            'n' => Code::Size,
            'c' => Code::Byte,
            'C' => Code::Char,
            'd' | 'f' => Code::Double,
            'S' | 'N' | 'O' => Code::Passthrough,
            'u' | 'D' => return Err(BridgeError::Unimplemented(key)),
            other => return Err(BridgeError::UnknownCode(other)),
        };
        Ok(code)
    }
}

/// A pre-tagged argument for the encoder
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a>
{
    /// Nullable text
    Str(Option<&'a str>),
    /// Byte buffer
    Bytes(&'a [u8]),
    /// C `int`
    Int(i32),
    /// C `unsigned int`
    UInt(u32),
    /// C `long` / `long long`
    Long(i64),
    /// C `unsigned long` / `unsigned long long`
    ULong(u64),
    /// C `size_t`
    Size(usize),
    /// C `char`
    Char(u8),
    /// C `double`
    Double(f64),
    /// Already-built record
    Record(Record),
}

impl Arg<'_>
{
    fn kind(&self) -> &'static str
    {
        match self {
            Arg::Str(_) => "string",
            Arg::Bytes(_) => "bytes",
            Arg::Int(_) => "int",
            Arg::UInt(_) => "unsigned int",
            Arg::Long(_) => "long",
            Arg::ULong(_) => "unsigned long",
            Arg::Size(_) => "size",
            Arg::Char(_) => "char",
            Arg::Double(_) => "double",
            Arg::Record(_) => "record",
        }
    }
}

impl<'a> From<&'a str> for Arg<'a>
{
    fn from(value: &'a str) -> Self
    {
        Arg::Str(Some(value))
    }
}

impl<'a> From<Option<&'a str>> for Arg<'a>
{
    fn from(value: Option<&'a str>) -> Self
    {
        Arg::Str(value)
    }
}

impl<'a> From<&'a [u8]> for Arg<'a>
{
    fn from(value: &'a [u8]) -> Self
    {
        Arg::Bytes(value)
    }
}

impl From<i32> for Arg<'_>
{
    fn from(value: i32) -> Self
    {
        Arg::Int(value)
    }
}

impl From<bool> for Arg<'_>
{
    fn from(value: bool) -> Self
    {
        Arg::Int(i32::from(value))
    }
}

impl From<u32> for Arg<'_>
{
    fn from(value: u32) -> Self
    {
        Arg::UInt(value)
    }
}

impl From<i64> for Arg<'_>
{
    fn from(value: i64) -> Self
    {
        Arg::Long(value)
    }
}

impl From<u64> for Arg<'_>
{
    fn from(value: u64) -> Self
    {
        Arg::ULong(value)
    }
}

impl From<usize> for Arg<'_>
{
    fn from(value: usize) -> Self
    {
        Arg::Size(value)
    }
}

impl From<u8> for Arg<'_>
{
    fn from(value: u8) -> Self
    {
        Arg::Char(value)
    }
}

impl From<f64> for Arg<'_>
{
    fn from(value: f64) -> Self
    {
        Arg::Double(value)
    }
}

impl From<Record> for Arg<'_>
{
    fn from(value: Record) -> Self
    {
        Arg::Record(value)
    }
}

/// A parsed, fully validated format spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec
{
    source: String,
    keys: Vec<(char, Code)>,
}

impl FormatSpec
{
    /// Parse every key of `spec` up front.
    ///
    /// ## Errors
    ///
    /// - `UnknownCode`: a character outside the conversion table
    /// - `Unimplemented`: `u` or `D`
    pub fn parse(spec: &str) -> Result<Self>
    {
        let keys = spec
            .chars()
            .map(|key| Code::try_from(key).map(|code| (key, code)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: spec.to_owned(),
            keys,
        })
    }

    /// Number of fields this spec produces.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.keys.len()
    }

    /// Whether the spec has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.keys.is_empty()
    }

    /// The spec text this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str
    {
        &self.source
    }

    /// Encode `args` (and, when given, `names`) into a record.
    ///
    /// Nothing is returned unless every argument converts, so a record is
    /// never truncated.
    ///
    /// ## Errors
    ///
    /// - `ArityMismatch`: argument or name count differs from the key count
    /// - `ArgumentMismatch`: an argument's kind does not fit its key
    pub fn encode(&self, names: Option<&[&str]>, args: Vec<Arg<'_>>) -> Result<Record>
    {
        if args.len() != self.keys.len() {
            return Err(self.arity("arguments", args.len()));
        }
        if let Some(names) = names {
            if names.len() != self.keys.len() {
                return Err(self.arity("names", names.len()));
            }
        }
        trace!(spec = %self.source, named = names.is_some(), "encoding record");

        let mut builder = RecordBuilder::with_capacity(self.keys.len());
        for (index, (&(key, code), arg)) in self.keys.iter().zip(args).enumerate() {
            let name = names.map(|n| n[index].to_owned());
            let value = convert(index, key, code, arg)?;
            builder.push(name, value);
        }
        Ok(builder.build())
    }

    fn arity(&self, what: &'static str, found: usize) -> BridgeError
    {
        BridgeError::ArityMismatch {
            spec: self.source.clone(),
            what,
            expected: self.keys.len(),
            found,
        }
    }
}

// Wide keys mirror the host's double-backed numbers, so precision loss above
// 2^53 is part of the contract.
#[allow(clippy::cast_precision_loss)]
fn convert(index: usize, key: char, code: Code, arg: Arg<'_>) -> Result<Variant>
{
    let value = match (code, arg) {
        (Code::Text, Arg::Str(Some(s))) => Variant::text(s),
        (Code::Text, Arg::Str(None)) => Variant::Null,
        (Code::Bytes, Arg::Bytes(b)) => Variant::Bytes(b.to_vec()),
        (Code::Bytes, Arg::Str(Some(s))) => Variant::Bytes(s.as_bytes().to_vec()),
        (Code::Integer, Arg::Int(v)) => Variant::Integer(v),
        (Code::UnsignedInteger, Arg::UInt(v)) => Variant::UnsignedInteger(v),
        (Code::Long | Code::LongLong, Arg::Long(v)) => Variant::Wide(v as f64),
        (Code::UnsignedLong | Code::UnsignedLongLong, Arg::ULong(v)) => Variant::Wide(v as f64),
        (Code::Size, Arg::Size(v)) => Variant::Wide(v as f64),
        (Code::Byte, Arg::Char(b)) => Variant::Byte(b),
        (Code::Char, Arg::Char(b)) => Variant::Char(char::from(b)),
        (Code::Double, Arg::Double(v)) => Variant::Double(v),
        (Code::Passthrough, Arg::Record(r)) => Variant::Record(r),
        (_, other) => {
            return Err(BridgeError::ArgumentMismatch {
                index,
                code: key,
                found: other.kind(),
            })
        }
    };
    Ok(value)
}

/// Encode an unnamed record.
///
/// ## Errors
///
/// See [`FormatSpec::parse`] and [`FormatSpec::encode`].
pub fn build_list(spec: &str, args: Vec<Arg<'_>>) -> Result<Record>
{
    FormatSpec::parse(spec)?.encode(None, args)
}

/// Encode a named record; `names[i]` labels field `i`.
///
/// ## Errors
///
/// See [`FormatSpec::parse`] and [`FormatSpec::encode`].
pub fn build_named_list(spec: &str, names: &[&str], args: Vec<Arg<'_>>) -> Result<Record>
{
    FormatSpec::parse(spec)?.encode(Some(names), args)
}

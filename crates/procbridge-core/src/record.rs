//! # Records
//!
//! The structured value every bridge call hands back to its host.
//!
//! A [`Record`] is an ordered list of [`Field`]s, each an optional name plus a
//! [`Variant`]. Records are built once (by the format encoder or a
//! [`RecordBuilder`]) and never mutated afterwards.
//!
//! ## Example
//!
//! ```rust
//! use procbridge_core::record::{RecordBuilder, Variant};
//!
//! let record = RecordBuilder::new()
//!     .named("label", Variant::text("bob"))
//!     .named("count", Variant::Integer(5))
//!     .build();
//!
//! assert_eq!(record.get_named("count"), Some(&Variant::Integer(5)));
//! assert_eq!(record.names(), Some(vec!["label", "count"]));
//! ```

use std::fmt;

/// A single typed value inside a [`Record`]
///
/// Integer widths follow the host's model: 32-bit integers stay integers,
/// while `long`, `unsigned long`, 64-bit and size values are widened into an
/// `f64` magnitude ([`Variant::Wide`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Variant
{
    /// Absent text value
    Null,
    /// Signed 32-bit integer
    Integer(i32),
    /// Unsigned 32-bit integer
    UnsignedInteger(u32),
    /// Wide integer widened to a double
    Wide(f64),
    /// Double-precision float
    Double(f64),
    /// Single raw byte
    Byte(u8),
    /// Single character, rendered as one-character text
    Char(char),
    /// Text string
    Text(String),
    /// Raw byte buffer
    Bytes(Vec<u8>),
    /// Boolean flag
    Logical(bool),
    /// Nested record, inserted verbatim
    Record(Record),
}

impl Variant
{
    /// Text variant from anything string-like.
    pub fn text(value: impl Into<String>) -> Self
    {
        Variant::Text(value.into())
    }

    /// Short kind name used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str
    {
        match self {
            Variant::Null => "null",
            Variant::Integer(_) => "integer",
            Variant::UnsignedInteger(_) => "unsigned integer",
            Variant::Wide(_) => "wide integer",
            Variant::Double(_) => "double",
            Variant::Byte(_) => "byte",
            Variant::Char(_) => "char",
            Variant::Text(_) => "text",
            Variant::Bytes(_) => "bytes",
            Variant::Logical(_) => "logical",
            Variant::Record(_) => "record",
        }
    }

    /// Borrow the text, if this is a [`Variant::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            Variant::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is [`Variant::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool
    {
        matches!(self, Variant::Null)
    }
}

impl fmt::Display for Variant
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Variant::Null => f.write_str("NULL"),
            Variant::Integer(v) => write!(f, "{v}"),
            Variant::UnsignedInteger(v) => write!(f, "{v}"),
            Variant::Wide(v) | Variant::Double(v) => write!(f, "{v}"),
            Variant::Byte(b) => write!(f, "0x{b:02x}"),
            Variant::Char(c) => write!(f, "{:?}", c.to_string()),
            Variant::Text(s) => write!(f, "{s:?}"),
            Variant::Bytes(bytes) => {
                f.write_str("<")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                f.write_str(">")
            }
            Variant::Logical(v) => f.write_str(if *v { "TRUE" } else { "FALSE" }),
            Variant::Record(r) => write!(f, "{r}"),
        }
    }
}

/// One entry of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field
{
    /// Field name; `None` for unnamed records
    pub name: Option<String>,
    /// Field value
    pub value: Variant,
}

/// Ordered, optionally named sequence of typed fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record
{
    fields: Vec<Field>,
}

impl Record
{
    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.fields.is_empty()
    }

    /// Value at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Variant>
    {
        self.fields.get(index).map(|f| &f.value)
    }

    /// Value of the first field called `name`.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Variant>
    {
        self.fields
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
            .map(|f| &f.value)
    }

    /// Field names in order, or `None` if the record is unnamed.
    ///
    /// A record is named when every field carries a name.
    #[must_use]
    pub fn names(&self) -> Option<Vec<&str>>
    {
        self.fields.iter().map(|f| f.name.as_deref()).collect()
    }

    /// Iterate over the fields.
    pub fn iter(&self) -> std::slice::Iter<'_, Field>
    {
        self.fields.iter()
    }

    /// Iterate over the values, ignoring names.
    pub fn values(&self) -> impl Iterator<Item = &Variant>
    {
        self.fields.iter().map(|f| &f.value)
    }
}

impl<'a> IntoIterator for &'a Record
{
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.fields.iter()
    }
}

impl fmt::Display for Record
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let named = self.names().is_some() && !self.is_empty();
        f.write_str(if named { "{" } else { "[" })?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(name) = &field.name {
                write!(f, "{name}: ")?;
            }
            write!(f, "{}", field.value)?;
        }
        f.write_str(if named { "}" } else { "]" })
    }
}

/// Fluent, append-only construction of a [`Record`]
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder
{
    fields: Vec<Field>,
}

impl RecordBuilder
{
    /// Start an empty record.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Start an empty record with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self
    {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append an unnamed field.
    #[must_use]
    pub fn value(mut self, value: Variant) -> Self
    {
        self.push(None, value);
        self
    }

    /// Append a named field.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: Variant) -> Self
    {
        self.push(Some(name.into()), value);
        self
    }

    /// Append a field in place.
    pub fn push(&mut self, name: Option<String>, value: Variant)
    {
        self.fields.push(Field { name, value });
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> Record
    {
        Record { fields: self.fields }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_builder_preserves_order()
    {
        let record = RecordBuilder::new()
            .value(Variant::text("a"))
            .value(Variant::Integer(1))
            .value(Variant::Null)
            .build();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get(0), Some(&Variant::text("a")));
        assert_eq!(record.get(1), Some(&Variant::Integer(1)));
        assert!(record.get(2).is_some_and(Variant::is_null));
        assert_eq!(record.names(), None);
    }

    #[test]
    fn test_partially_named_record_has_no_names()
    {
        let record = RecordBuilder::new()
            .named("a", Variant::Integer(1))
            .value(Variant::Integer(2))
            .build();
        assert_eq!(record.names(), None);
        assert_eq!(record.get_named("a"), Some(&Variant::Integer(1)));
    }

    #[test]
    fn test_display_unnamed_and_named()
    {
        let unnamed = RecordBuilder::new()
            .value(Variant::text("hello"))
            .value(Variant::Integer(42))
            .build();
        assert_eq!(unnamed.to_string(), r#"["hello", 42]"#);

        let named = RecordBuilder::new()
            .named("label", Variant::text("bob"))
            .named("count", Variant::Integer(5))
            .build();
        assert_eq!(named.to_string(), r#"{label: "bob", count: 5}"#);
    }

    #[test]
    fn test_display_nested_and_bytes()
    {
        let inner = RecordBuilder::new().named("LINUX", Variant::Logical(true)).build();
        let outer = RecordBuilder::new()
            .value(Variant::Bytes(vec![0xde, 0xad]))
            .value(Variant::Record(inner))
            .build();
        assert_eq!(outer.to_string(), "[<de ad>, {LINUX: TRUE}]");
    }

    #[test]
    fn test_display_char_as_one_character_text()
    {
        let record = RecordBuilder::new()
            .value(Variant::Char('R'))
            .value(Variant::text("R"))
            .build();
        assert_eq!(record.to_string(), r#"["R", "R"]"#);
    }
}

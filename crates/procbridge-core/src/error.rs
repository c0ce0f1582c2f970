//! # Error Types
//!
//! Every failure a bridge call can report.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages. The message text of a variant is exactly what the
//! host sees, so system failures carry the full text recorded by the
//! [`ErrorChannel`](crate::channel::ErrorChannel).

use thiserror::Error;

/// Main error type for bridge operations
///
/// ## Error Categories
///
/// 1. **Programmer errors**: UnknownCode, Unimplemented, ArityMismatch,
///    ArgumentMismatch, UnknownCall, CallArity, InvalidArgument
/// 2. **System errors**: System, NotFound
/// 3. **Resource errors**: TooLarge (kernel string exceeded its cap)
/// 4. **Channel errors**: Failed (custom message), Unknown (empty channel)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError
{
    /// A format spec contained a character outside the conversion table
    ///
    /// Non-alphabetic characters are unknown keys too.
    #[error("Unknown conversion key: `{0}`")]
    UnknownCode(char),

    /// A format spec contained one of the reserved keys `u` or `D`
    #[error("'{0}' is not implemented yet")]
    Unimplemented(char),

    /// The number of arguments (or names) differs from the number of keys
    #[error("Format `{spec}` expects {expected} {what}, got {found}")]
    ArityMismatch
    {
        /// The offending format spec
        spec: String,
        /// What was being counted ("arguments" or "names")
        what: &'static str,
        /// Number of conversion keys
        expected: usize,
        /// Number supplied by the caller
        found: usize,
    },

    /// An argument's kind does not fit its conversion key
    #[error("Argument {index} does not match conversion key `{code}`: got {found}")]
    ArgumentMismatch
    {
        /// Zero-based field position
        index: usize,
        /// The conversion key at that position
        code: char,
        /// Kind of the argument that was supplied
        found: &'static str,
    },

    /// An OS primitive reported failure
    ///
    /// The message is `"System error: <OS text>"`.
    #[error("{0}")]
    System(String),

    /// An OS primitive reported that the target does not exist
    ///
    /// Raised for `ENOENT` and for empty symbolic-link targets.
    #[error("{0}")]
    NotFound(String),

    /// A kernel string did not fit under the configured size cap
    #[error("{0}")]
    TooLarge(String),

    /// A custom failure message set with `set_formatted`
    #[error("{0}")]
    Failed(String),

    /// The error channel was thrown while empty
    ///
    /// Every failure path sets a message first, so seeing this is a bug.
    #[error("Unknown error")]
    Unknown,

    /// No bridge call is registered under the given name
    #[error("Unknown bridge call: {0}")]
    UnknownCall(String),

    /// A bridge call was invoked with the wrong number of arguments
    #[error("Bridge call `{name}` expects {expected} arguments, got {found}")]
    CallArity
    {
        /// Registered call name
        name: &'static str,
        /// Registered arity
        expected: usize,
        /// Number of arguments supplied
        found: usize,
    },

    /// A host argument could not be converted (e.g. a malformed pid)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl BridgeError
{
    /// Whether this error indicates a caller/encoder mismatch rather than a
    /// runtime condition.
    #[must_use]
    pub fn is_programmer_error(&self) -> bool
    {
        matches!(
            self,
            Self::UnknownCode(_)
                | Self::Unimplemented(_)
                | Self::ArityMismatch { .. }
                | Self::ArgumentMismatch { .. }
                | Self::UnknownCall(_)
                | Self::CallArity { .. }
                | Self::InvalidArgument(_)
        )
    }
}

/// Convenience type alias for `Result<T, BridgeError>`
///
/// ```rust
/// use procbridge_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, BridgeError>;

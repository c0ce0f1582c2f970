//! Common module for library exports

pub use crate::capability::{os_type, CapabilityFlags};
pub use crate::channel::ErrorChannel;
pub use crate::error::{BridgeError, Result};
pub use crate::format::{build_list, build_named_list, Arg, FormatSpec};
pub use crate::record::{Field, Record, RecordBuilder, Variant};
pub use crate::types::ProcessId;

//! # procbridge-core
//!
//! Typed records, error reporting and OS process queries for procbridge.
//!
//! This crate provides the machinery every bridge call is built from:
//! - A format encoder that turns typed values into [`Record`]s
//! - A per-call [`ErrorChannel`] for reporting OS failures
//! - A growing-buffer protocol for kernel strings of unknown length
//! - Compile-time platform capability flags
//!
//! On top of that sit the per-OS process queries (`platform`) and the call
//! table a host dispatches through (`registry`).
//!
//! ## Platform Support
//!
//! - **Linux**: `/proc`, `readlink(2)`, `sysconf`
//! - **macOS**: `libproc`, `sysctl(KERN_PROCARGS2)`
//! - **Other Unix**: `pid_exists` and `readlink` only
//! - **Windows**: capability flags only
//!
//! ## Why unsafe code is needed
//!
//! The queries call `libc` functions (`kill`, `readlink`, `sysconf`,
//! `sysctl`, `strerror_r`) directly. Each call is wrapped in a safe function
//! that owns its buffers and reports failures through the error channel.

#![allow(unsafe_code)] // Required for libc system calls

pub mod capability;
pub mod channel;
pub mod config;
pub mod error;
pub mod format;
pub mod kernel_string;
pub mod platform;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod types;

pub use channel::ErrorChannel;
// Re-export commonly used types
pub use error::{BridgeError, Result};
pub use record::{Record, RecordBuilder, Variant};
pub use types::ProcessId;

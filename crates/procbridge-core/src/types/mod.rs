//! # Types
//!
//! Platform-agnostic types shared by the bridge calls.

pub mod process;

// Re-export all public types
pub use process::ProcessId;

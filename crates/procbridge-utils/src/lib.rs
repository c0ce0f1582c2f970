//! # procbridge Utilities
//!
//! Shared utilities for procbridge.
//!
//! Currently this is the logging setup built on `tracing`, used by the CLI.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_file_logging, init_logging, init_logging_with_level, LogFormat, LogGuard, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};

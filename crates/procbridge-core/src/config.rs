//! # Bridge Configuration
//!
//! Process-wide settings read once from the environment.
//!
//! ## Environment Variables
//!
//! - `PROCBRIDGE_DEBUG`: when present, enables debug mode
//! - `PROCBRIDGE_TESTING`: when present, enables testing mode
//! - `PROCBRIDGE_MAX_KERNEL_STRING`: largest buffer (in bytes) a kernel string
//!   query may grow to (default 1 MiB, never below 1024)

use std::env;

use once_cell::sync::OnceCell;
use tracing::warn;

use crate::kernel_string::{DEFAULT_MAX_CAPACITY, INITIAL_CAPACITY};

/// Environment variable that turns on debug mode.
pub const DEBUG_ENV: &str = "PROCBRIDGE_DEBUG";
/// Environment variable that turns on testing mode.
pub const TESTING_ENV: &str = "PROCBRIDGE_TESTING";
/// Environment variable overriding the kernel string size cap.
pub const MAX_KERNEL_STRING_ENV: &str = "PROCBRIDGE_MAX_KERNEL_STRING";

/// Settings shared by every bridge call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig
{
    /// Debug mode
    pub debug: bool,
    /// Testing mode
    pub testing: bool,
    /// Upper bound on a kernel string query's buffer
    pub max_kernel_string: usize,
}

impl Default for BridgeConfig
{
    fn default() -> Self
    {
        Self {
            debug: false,
            testing: false,
            max_kernel_string: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl BridgeConfig
{
    /// Build a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Flags are on when their variable is present at all, whatever its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {
        let max_kernel_string = match lookup(MAX_KERNEL_STRING_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(bytes) => bytes.max(INITIAL_CAPACITY),
                Err(_) => {
                    warn!("Ignoring invalid {MAX_KERNEL_STRING_ENV}={raw:?}");
                    DEFAULT_MAX_CAPACITY
                }
            },
            None => DEFAULT_MAX_CAPACITY,
        };

        Self {
            debug: lookup(DEBUG_ENV).is_some(),
            testing: lookup(TESTING_ENV).is_some(),
            max_kernel_string,
        }
    }
}

static CONFIG: OnceCell<BridgeConfig> = OnceCell::new();

/// The process-wide configuration.
///
/// The environment is read by the first call and never again; hosts call this
/// once at startup so later changes to the environment have no effect.
pub fn get() -> &'static BridgeConfig
{
    CONFIG.get_or_init(BridgeConfig::from_env)
}

//! # Logging Utilities
//!
//! Logging infrastructure for procbridge using `tracing`.
//!
//! Records are written to stdout by the CLI, so console logs go to stderr.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procbridge_utils::{init_logging, LogLevel};
//!
//! // Keep the guard alive until exit so file output is flushed
//! let _guard = init_logging(LogLevel::Info).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=procbridge_core=trace`)
//! - `PROCBRIDGE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `PROCBRIDGE_LOG_FILE`: Optional path to a daily-rotated log file

use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "PROCBRIDGE_LOG_FORMAT";
/// Environment variable naming an extra log file.
pub const LOG_FILE_ENV: &str = "PROCBRIDGE_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s} (use 'pretty' or 'json')"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s} (use 'error', 'warn', 'info', 'debug', or 'trace')"
            ))),
        }
    }
}

/// Keeps background log writers alive
///
/// Dropping the guard flushes and stops file output.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard
{
    file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn build_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);

    match format {
        LogFormat::Pretty => base.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_appender(path: &Path, daily: bool) -> RollingFileAppender
{
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_else(|| OsStr::new("procbridge.log"));

    if daily {
        rolling::daily(directory, file_name)
    } else {
        rolling::never(directory, file_name)
    }
}

fn install(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Initialize logging from the environment
///
/// `RUST_LOG` overrides `default_level`; see the module docs for the other
/// variables.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `PROCBRIDGE_LOG_FORMAT` holds an unknown format
pub fn init_logging(default_level: LogLevel) -> Result<LogGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(raw) => raw.parse()?,
        Err(_) => LogFormat::Pretty,
    };
    init_logging_with_level(default_level, format)
}

/// Initialize logging with explicit level and format
///
/// Console output goes to stderr. When `PROCBRIDGE_LOG_FILE` is set, events
/// are also written (without ANSI colours) to that file, rotated daily.
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    // RUST_LOG can override the default level with more specific filters
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::from(level).to_string()));

    let mut layers = vec![build_layer(format, io::stderr, true, filter.clone())];
    let mut guard = LogGuard::default();

    if let Some(path) = env::var_os(LOG_FILE_ENV).map(PathBuf::from) {
        let (writer, worker) = tracing_appender::non_blocking(file_appender(&path, true));
        layers.push(build_layer(format, writer, false, filter));
        guard.file = Some(worker);
    }

    install(layers)?;
    Ok(guard)
}

/// Initialize file-only logging, leaving stdout and stderr untouched
///
/// Events go to `~/.procbridge/YYYY-MM-DD-procbridge.log`, or the same name in
/// the system temp directory when `HOME` is not set.
///
/// Level priority: `level` if given, then `RUST_LOG`, then INFO.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_file_logging(level: Option<LogLevel>) -> Result<(PathBuf, LogGuard), LoggingError>
{
    let today = Local::now().format("%Y-%m-%d");
    let directory = match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".procbridge"),
        None => env::temp_dir(),
    };
    std::fs::create_dir_all(&directory)?;
    let log_file = directory.join(format!("{today}-procbridge.log"));

    let filter = match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    };

    // The date is already in the file name, so never rotate.
    let (writer, worker) = tracing_appender::non_blocking(file_appender(&log_file, false));
    install(vec![build_layer(LogFormat::Pretty, writer, false, filter)])?;

    Ok((log_file, LogGuard { file: Some(worker) }))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

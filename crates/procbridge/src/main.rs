use std::process;

use clap::{Parser, Subcommand};
use procbridge_core::registry;
use procbridge_core::config::{self, BridgeConfig};
use procbridge_core::{Record, Result as BridgeResult};
use procbridge_utils::{debug, init_file_logging, init_logging, LogGuard, LogLevel, LoggingError};

/// Query operating-system process attributes as typed records.
#[derive(Parser, Debug)]
#[command(name = "procbridge")]
#[command(version)]
#[command(about = "Query operating-system process attributes as typed records", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG; defaults to debug when PROCBRIDGE_DEBUG is set)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Write logs only to ~/.procbridge instead of stderr
    #[arg(long, global = true, default_value_t = false)]
    log_file_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Invoke any registered bridge call by name
    Call
    {
        /// Registered call name (see `procbridge list`)
        name: String,
        /// Call arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List the bridge calls available on this platform
    List,
    /// Show which OS family this build targets
    OsType,
    /// Check whether a process exists
    PidExists
    {
        /// Process ID (PID)
        pid: u32,
    },
    /// Resolve a symbolic link
    Readlink
    {
        /// Path of the link
        path: String,
    },
    /// List all process IDs
    Pids,
    /// Executable path of a process
    Exe
    {
        /// Process ID (PID); defaults to procbridge itself
        pid: Option<u32>,
    },
    /// Command line of a process
    Cmdline
    {
        /// Process ID (PID); defaults to procbridge itself
        pid: Option<u32>,
    },
    /// Environment of a process
    Environ
    {
        /// Process ID (PID); defaults to procbridge itself
        pid: Option<u32>,
    },
    /// Working directory of a process
    Cwd
    {
        /// Process ID (PID); defaults to procbridge itself
        pid: Option<u32>,
    },
}

fn start_logging(cli: &Cli, config: &BridgeConfig) -> Result<LogGuard, LoggingError>
{
    let default_level = if config.debug {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    if cli.log_file_only {
        let (_path, guard) = init_file_logging(cli.log_level)?;
        Ok(guard)
    } else {
        init_logging(cli.log_level.unwrap_or(default_level))
    }
}

fn main()
{
    let cli = Cli::parse();
    let config = config::get();

    let _guard = match start_logging(&cli, config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    debug!(
        debug = config.debug,
        testing = config.testing,
        max_kernel_string = config.max_kernel_string,
        "Bridge configuration loaded"
    );

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn pid_or_self(pid: Option<u32>) -> String
{
    pid.unwrap_or_else(process::id).to_string()
}

fn run_command(command: Commands) -> BridgeResult<()>
{
    match command {
        Commands::Call { name, args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            dispatch(&name, &args)
        }
        Commands::List => {
            for method in registry::methods() {
                println!("{} ({} args)", method.name, method.arity);
            }
            Ok(())
        }
        Commands::OsType => dispatch("os_type", &[]),
        Commands::PidExists { pid } => dispatch("pid_exists", &[pid.to_string().as_str()]),
        Commands::Readlink { path } => dispatch("readlink", &[path.as_str()]),
        Commands::Pids => dispatch("pids", &[]),
        Commands::Exe { pid } => dispatch("proc_exe", &[pid_or_self(pid).as_str()]),
        Commands::Cmdline { pid } => dispatch("proc_cmdline", &[pid_or_self(pid).as_str()]),
        Commands::Environ { pid } => dispatch("proc_environ", &[pid_or_self(pid).as_str()]),
        Commands::Cwd { pid } => dispatch("proc_cwd", &[pid_or_self(pid).as_str()]),
    }
}

fn dispatch(name: &str, args: &[&str]) -> BridgeResult<()>
{
    debug!("Calling {} with args: {:?}", name, args);
    let record = registry::call(name, args)?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &Record)
{
    match record.names() {
        Some(names) if !names.is_empty() => {
            for (name, value) in names.iter().zip(record.values()) {
                println!("{name}: {value}");
            }
        }
        _ => {
            for value in record.values() {
                println!("{value}");
            }
        }
    }
}

//! Command-line surface: one positional target-path argument plus the
//! ambient `--port`/`--trace`/`--config` flags (§6, §10.6). Everything else
//! on the line is forwarded to the target program untouched.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Verbosity fallback used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off | TraceLevel::Error => Self::ERROR,
            TraceLevel::Warn => Self::WARN,
            TraceLevel::Info => Self::INFO,
            TraceLevel::Debug => Self::DEBUG,
            TraceLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sdbg")]
#[command(version)]
#[command(about = "Remote, interactive source-level debugger session host")]
pub struct Cli {
    /// Target Lua program to debug.
    pub script: PathBuf,

    /// Arguments forwarded to the target program untouched.
    #[arg(trailing_var_arg = true)]
    pub script_args: Vec<String>,

    /// Loopback RPC port to bind.
    #[arg(long, env = "SDBG_PORT")]
    pub port: Option<u16>,

    /// Fallback log verbosity when `RUST_LOG` is unset. Overrides the
    /// config file's `log_level` when given; falls through to it when not.
    #[arg(long, value_enum)]
    pub trace: Option<TraceLevel>,

    /// Optional TOML configuration file.
    #[arg(long, env = "SDBG_CONFIG")]
    pub config: Option<PathBuf>,
}

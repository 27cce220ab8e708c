//! Session entry point (§4.4's session driver): starts the RPC listener,
//! waits for a client `start`, then loads and runs the target Lua program
//! under the engine's trace dispatch on its own thread.

mod cli;
mod config;
mod transport;

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, TraceLevel};
use config::EngineConfig;
use sdbg_core::{CommandInterface, SessionCoordinator, SessionState};
use sdbg_lua::{LuaCodeExecutor, LuaTraceBridge};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref())
        .context("loading configuration")?
        .with_port_override(cli.port);

    setup_tracing(cli.trace, config.log_level.as_deref());

    let session = SessionCoordinator::new(cli.script.clone());
    if let Some(breakpoints_file) = config.breakpoints_file.as_deref() {
        load_breakpoints(&session, breakpoints_file)?;
    }

    let iface = Arc::new(CommandInterface::new(session.clone()));
    let rpc_port = config.port;
    let rpc_iface = iface.clone();
    thread::spawn(move || {
        if let Err(e) = transport::serve(rpc_port, rpc_iface) {
            tracing::error!(error = %e, "rpc listener exited");
        }
    });

    tracing::info!(port = rpc_port, script = %cli.script.display(), "waiting for client start");
    while session.state() == SessionState::Initialized {
        thread::yield_now();
    }
    if session.state() == SessionState::Terminated {
        return Ok(());
    }

    let script_path = cli.script.clone();
    let script_args = cli.script_args.clone();
    let session_for_target = session.clone();
    let target = thread::spawn(move || -> Result<()> {
        let executor = LuaCodeExecutor::new();
        let bridge = LuaTraceBridge::new(session_for_target, 1, "main");
        bridge.install(executor.lua())?;
        executor
            .run_with_args(&script_path, &script_args)
            .map_err(|e| anyhow::anyhow!(e))
    });

    let result = target.join().expect("target thread panicked");
    while !session.is_drained() {
        thread::yield_now();
    }
    session.stop();

    result.context("target program raised an unhandled error")
}

fn load_breakpoints(session: &SessionCoordinator, path: &std::path::Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading breakpoints file {}", path.display()))?;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (file, line_no) = line
            .rsplit_once(':')
            .with_context(|| format!("malformed breakpoint entry {line:?}, expected path:line"))?;
        let line_no: u32 = line_no
            .parse()
            .with_context(|| format!("malformed breakpoint line number in {line:?}"))?;
        session
            .set_breakpoint(file, line_no)
            .with_context(|| format!("setting breakpoint from {line:?}"))?;
    }
    Ok(())
}

/// Priority: `RUST_LOG` > explicit `--trace` flag > config file's
/// `log_level` (itself already `SDBG_LOG_LEVEL`-overridden by
/// [`EngineConfig::load`]) > default (info).
///
/// Tracing output goes to stderr so stdout stays clean for the target
/// program's own output.
fn setup_tracing(trace_level: Option<TraceLevel>, config_log_level: Option<&str>) {
    use std::io;
    use tracing_subscriber::EnvFilter;

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .with_target(false)
            .init();
        return;
    }

    let level = trace_level
        .map(tracing::Level::from)
        .or_else(|| config_log_level.and_then(|s| s.parse().ok()))
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
